/*
 * @Author       : 老董
 * @Description  : 训练流水线：预处理 → 建模/编译 → 训练（含自动记录）→ 推断签名
 *                 → 本地保存并记录模型 → 测试集评估
 */

mod config;
mod error;


pub use config::TrainingConfig;
pub use error::PipelineError;

use std::path::PathBuf;

use crate::data::{MnistDataset, TensorDataset, load_data};
use crate::nn::{
    CompileOptions, Evaluation, FitOptions, History, INFERENCE_BATCH_SIZE, Model, ModelError,
    OptimizerConfig, Sequential,
};
use crate::signature::{ModelSignature, infer_signature};
use crate::tracking::{AutologCallback, Run, RunStatus, TrackingClient, log_model};

/// run 中保存配置的 artifact 路径
pub const CONFIG_ARTIFACT: &str = "config.json";

/// 一次完整训练的结果
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: String,
    pub history: History,
    pub evaluation: Evaluation,
    pub model_path: PathBuf,
    pub signature: ModelSignature,
}

impl PipelineReport {
    pub fn test_accuracy(&self) -> Option<f32> {
        self.evaluation.accuracy
    }

    /// 最终输出给用户的一行
    pub fn accuracy_line(&self) -> String {
        match self.evaluation.accuracy {
            Some(accuracy) => format!("Test accuracy: {accuracy}"),
            None => "Test accuracy: undefined (empty test split)".to_string(),
        }
    }
}

/// 按配置加载训练集与测试集，并按`train_limit`/`test_limit`截取
pub fn load_datasets(config: &TrainingConfig) -> Result<(MnistDataset, MnistDataset), PipelineError> {
    let (train, test) = load_data(config.data_dir.as_deref(), config.download)?;
    let train = match config.train_limit {
        Some(n) => train.take(n)?,
        None => train,
    };
    let test = match config.test_limit {
        Some(n) => test.take(n)?,
        None => test,
    };
    log::info!("数据集: 训练 {} 个样本，测试 {} 个样本", train.len(), test.len());
    Ok((train, test))
}

pub struct Pipeline {
    config: TrainingConfig,
    tracking: TrackingClient,
}

impl Pipeline {
    pub fn new(config: TrainingConfig, tracking: TrackingClient) -> Self {
        Self { config, tracking }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn tracking(&self) -> &TrackingClient {
        &self.tracking
    }

    /// 在一个新的 run 中完成训练、保存、记录与评估
    ///
    /// 成功时 run 以 `FINISHED` 结束；任一步失败时先以 `FAILED` 结束 run 再返回错误。
    pub fn run(&self, train: &MnistDataset, test: &MnistDataset) -> Result<PipelineReport, PipelineError> {
        self.config.validate()?;
        let num_classes = self.config.num_classes;
        let train_set = train.preprocess(num_classes)?;
        let test_set = test.preprocess(num_classes)?;

        let experiment = self.tracking.set_experiment(&self.config.experiment_name)?;
        let run = self.tracking.start_run(&experiment, None)?;

        let input_shape = train.input_shape();
        let result = self.run_steps(&run, &input_shape, &train_set, &test_set);
        match result {
            Ok(report) => {
                run.end(RunStatus::Finished)?;
                Ok(report)
            }
            Err(e) => {
                log::error!("训练流水线失败: {e}");
                if let Err(end_err) = run.end(RunStatus::Failed) {
                    log::warn!("无法将 run 标记为 FAILED: {end_err}");
                }
                Err(e)
            }
        }
    }

    fn run_steps(
        &self,
        run: &Run<'_>,
        input_shape: &[usize],
        train: &TensorDataset,
        test: &TensorDataset,
    ) -> Result<PipelineReport, PipelineError> {
        let config = &self.config;
        run.log_text(CONFIG_ARTIFACT, &config.to_json()?)?;

        let mut model =
            Sequential::mnist_mlp(input_shape, config.hidden_units, config.num_classes, config.seed)?;
        model.compile(CompileOptions {
            optimizer: OptimizerConfig::adam(config.learning_rate),
            ..Default::default()
        })?;
        log::info!("模型结构:\n{}", model.summary());

        let options = FitOptions {
            epochs: config.epochs,
            batch_size: config.batch_size,
            shuffle: config.shuffle,
            seed: config.seed,
            validation_data: Some(test),
        };
        let history = {
            let mut autolog = AutologCallback::new(run, config.autolog_every_n_iter);
            model.fit(train, &options, &mut [&mut autolog])?
        };

        let signature = self.infer_model_signature(&model, train)?;

        model.save(&config.model_path)?;
        log::info!("模型已保存到 {}", config.model_path.display());
        // 记录的模型与本地文件逐字节一致
        let model_bytes = std::fs::read(&config.model_path)?;
        log_model(run, &config.artifact_path, &model_bytes, &signature)?;

        let evaluation = model.evaluate(test.features(), test.labels())?;
        if let (Some(loss), Some(accuracy)) = (evaluation.loss, evaluation.accuracy) {
            run.log_metric("test_loss", f64::from(loss), config.epochs as i64)?;
            run.log_metric("test_accuracy", f64::from(accuracy), config.epochs as i64)?;
        } else {
            log::warn!("测试集为空，准确率无定义");
        }

        Ok(PipelineReport {
            run_id: run.run_id().to_string(),
            history,
            evaluation,
            model_path: config.model_path.clone(),
            signature,
        })
    }

    /// 用训练集开头的一批样本及其预测推断签名
    fn infer_model_signature(
        &self,
        model: &Sequential,
        train: &TensorDataset,
    ) -> Result<ModelSignature, PipelineError> {
        let sample = train
            .features()
            .rows(0..train.len().min(INFERENCE_BATCH_SIZE))
            .map_err(ModelError::from)?;
        let predictions = model.predict(&sample)?;
        Ok(infer_signature(&sample, &predictions)?)
    }
}
