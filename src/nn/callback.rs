/*
 * @Author       : 老董
 * @Description  : 训练过程回调：训练开始、每个 epoch 结束、训练结束
 */

use serde::Serialize;

use super::{Loss, Metric, ModelError, OptimizerConfig};

/// 单个 epoch 的训练结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochLogs {
    /// 从 0 开始
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    /// 未提供验证集或验证集为空时为 None
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
    pub duration_secs: f32,
}

impl EpochLogs {
    /// 本 epoch 中有定义的指标（名称, 值）
    pub fn metrics(&self) -> Vec<(&'static str, f32)> {
        let mut metrics = vec![("loss", self.loss), ("accuracy", self.accuracy)];
        if let Some(v) = self.val_loss {
            metrics.push(("val_loss", v));
        }
        if let Some(v) = self.val_accuracy {
            metrics.push(("val_accuracy", v));
        }
        metrics
    }
}

/// fit 的返回值：逐 epoch 的记录
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    pub epochs: Vec<EpochLogs>,
}

impl History {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochLogs> {
        self.epochs.last()
    }
}

/// 训练开始时交给回调的信息
#[derive(Debug, Clone)]
pub struct TrainBegin<'a> {
    pub epochs: usize,
    pub batch_size: usize,
    pub num_samples: usize,
    pub optimizer: &'a OptimizerConfig,
    pub loss: Loss,
    pub metric: Metric,
    pub num_params: usize,
    pub summary: &'a str,
}

/// 训练回调；回调返回错误会中止训练
pub trait TrainingCallback {
    fn on_train_begin(&mut self, _info: &TrainBegin<'_>) -> Result<(), ModelError> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _logs: &EpochLogs) -> Result<(), ModelError> {
        Ok(())
    }

    fn on_train_end(&mut self, _history: &History) -> Result<(), ModelError> {
        Ok(())
    }
}
