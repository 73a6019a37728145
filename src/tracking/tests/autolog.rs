//! 自动记录回调单元测试

use super::temp_client;
use crate::data::MnistDataset;
use crate::nn::{CompileOptions, FitOptions, Model, Sequential};
use crate::tracking::{AutologCallback, MODEL_SUMMARY_ARTIFACT, RunStatus};

#[test]
fn test_autolog_records_params_metrics_and_summary() {
    let (_dir, client) = temp_client();
    let experiment = client.set_experiment("exp").unwrap();
    let run = client.start_run(&experiment, None).unwrap();

    let train = MnistDataset::synthetic(12, 0).unwrap().preprocess(10).unwrap();
    let val = MnistDataset::synthetic(4, 1).unwrap().preprocess(10).unwrap();
    let mut model = Sequential::mnist_mlp(&[28, 28], 8, 10, 0).unwrap();
    model.compile(CompileOptions::default()).unwrap();

    let options = FitOptions {
        epochs: 3,
        batch_size: 4,
        validation_data: Some(&val),
        ..Default::default()
    };
    {
        let mut autolog = AutologCallback::new(&run, 2);
        model.fit(&train, &options, &mut [&mut autolog]).unwrap();
    }

    let run_id = run.run_id().to_string();
    let artifact_root = std::path::PathBuf::from(&run.info().artifact_uri);
    run.end(RunStatus::Finished).unwrap();

    let record = client.get_run(&run_id).unwrap();
    let params = &record.data.params;
    assert_eq!(params["epochs"], "3");
    assert_eq!(params["batch_size"], "4");
    assert_eq!(params["optimizer_name"], "Adam");
    assert_eq!(params["learning_rate"], "0.001");
    assert_eq!(params["beta_1"], "0.9");
    assert_eq!(params["loss"], "categorical_crossentropy");
    assert_eq!(params["num_params"], model.num_params().to_string());

    // every_n_iter = 2：只记录第 0、2 个 epoch
    let history = client.store().get_metric_history(&run_id, "val_accuracy").unwrap();
    let steps: Vec<i64> = history.iter().map(|m| m.step).collect();
    assert_eq!(steps, vec![0, 2]);
    for key in ["loss", "accuracy", "val_loss", "val_accuracy"] {
        assert!(record.data.metrics.contains_key(key), "缺少指标 {key}");
    }

    let summary = std::fs::read_to_string(artifact_root.join(MODEL_SUMMARY_ARTIFACT)).unwrap();
    assert_eq!(summary, model.summary());
}
