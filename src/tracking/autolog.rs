/*
 * @Author       : 老董
 * @Description  : 自动记录训练参数、逐 epoch 指标与模型结构
 */

use super::{Run, TrackingError};
use crate::nn::{EpochLogs, ModelError, TrainBegin, TrainingCallback};

/// 模型结构摘要的 artifact 路径
pub const MODEL_SUMMARY_ARTIFACT: &str = "model_summary.txt";

/// 挂到 fit 上的追踪回调
pub struct AutologCallback<'r, 'a> {
    run: &'r Run<'a>,
    every_n_iter: usize,
}

impl<'r, 'a> AutologCallback<'r, 'a> {
    /// 每`every_n_iter`个 epoch 记录一次指标（0 按 1 处理）
    pub fn new(run: &'r Run<'a>, every_n_iter: usize) -> Self {
        Self {
            run,
            every_n_iter: every_n_iter.max(1),
        }
    }
}

fn callback_error(e: TrackingError) -> ModelError {
    ModelError::Callback(Box::new(e))
}

impl TrainingCallback for AutologCallback<'_, '_> {
    fn on_train_begin(&mut self, info: &TrainBegin<'_>) -> Result<(), ModelError> {
        let mut params = vec![
            ("epochs", info.epochs.to_string()),
            ("batch_size", info.batch_size.to_string()),
            ("optimizer_name", info.optimizer.name().to_string()),
        ];
        params.extend(
            info.optimizer
                .hyper_params()
                .into_iter()
                .map(|(k, v)| (k, v.to_string())),
        );
        params.push(("loss", info.loss.name().to_string()));
        params.push(("num_params", info.num_params.to_string()));

        self.run.log_params(params).map_err(callback_error)?;
        self.run
            .log_text(MODEL_SUMMARY_ARTIFACT, info.summary)
            .map_err(callback_error)
    }

    fn on_epoch_end(&mut self, logs: &EpochLogs) -> Result<(), ModelError> {
        if logs.epoch % self.every_n_iter != 0 {
            return Ok(());
        }
        for (key, value) in logs.metrics() {
            self.run
                .log_metric(key, f64::from(value), logs.epoch as i64)
                .map_err(callback_error)?;
        }
        Ok(())
    }
}
