//! 客户端与 run 生命周期单元测试

use super::temp_client;
use crate::tracking::{RunStatus, TrackingClient, TrackingError};

#[test]
fn test_from_uri_selects_store() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("runs");

    let local = TrackingClient::from_uri(&format!("file://{}", root.display())).unwrap();
    assert_eq!(local.uri(), root.display().to_string());
    assert!(root.is_dir());

    let remote = TrackingClient::from_uri("http://127.0.0.1:5000/").unwrap();
    assert_eq!(remote.uri(), "http://127.0.0.1:5000");
}

#[test]
fn test_run_lifecycle() {
    let (_dir, client) = temp_client();
    let experiment = client.set_experiment("MLtestped MNIST").unwrap();
    let run = client.start_run(&experiment, Some("train")).unwrap();
    let run_id = run.run_id().to_string();

    run.log_params([("epochs", 5), ("batch_size", 1)]).unwrap();
    run.log_metric("accuracy", 0.75, 0).unwrap();
    run.set_tag("stage", "test").unwrap();
    run.log_text("notes/readme.txt", "hi").unwrap();

    let info = run.end(RunStatus::Finished).unwrap();
    assert_eq!(info.status, RunStatus::Finished);
    assert!(info.end_time.is_some());

    let record = client.get_run(&run_id).unwrap();
    assert_eq!(record.info.status, RunStatus::Finished);
    assert_eq!(record.data.params["epochs"], "5");
    assert_eq!(record.data.params["batch_size"], "1");
    assert_eq!(record.data.metrics["accuracy"], 0.75);
}

#[test]
fn test_dropped_run_is_marked_failed() {
    let (_dir, client) = temp_client();
    let experiment = client.set_experiment("exp").unwrap();
    let run_id = {
        let run = client.start_run(&experiment, None).unwrap();
        run.run_id().to_string()
    };

    assert_eq!(client.get_run(&run_id).unwrap().info.status, RunStatus::Failed);
}

#[test]
fn test_ending_a_finished_run_again_fails() {
    let (_dir, client) = temp_client();
    let experiment = client.set_experiment("exp").unwrap();
    let run = client.start_run(&experiment, None).unwrap();
    let run_id = run.run_id().to_string();
    run.end(RunStatus::Finished).unwrap();

    assert!(matches!(
        client
            .store()
            .update_run(&run_id, RunStatus::Finished, None),
        Err(TrackingError::InvalidState(_))
    ));
}
