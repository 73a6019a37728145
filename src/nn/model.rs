use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{History, Loss, Metric, ModelError, OptimizerConfig, TrainingCallback};
use crate::data::TensorDataset;
use crate::tensor::Tensor;

/// compile 时绑定的优化器、损失与指标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CompileOptions {
    pub optimizer: OptimizerConfig,
    pub loss: Loss,
    pub metric: Metric,
}

/// fit 的参数
#[derive(Debug, Clone, Copy)]
pub struct FitOptions<'a> {
    pub epochs: usize,
    /// 1 表示逐样本更新
    pub batch_size: usize,
    pub shuffle: bool,
    /// 第 i 个 epoch 用 `seed + i` 打乱
    pub seed: u64,
    /// 每个 epoch 结束后评估
    pub validation_data: Option<&'a TensorDataset>,
}

impl Default for FitOptions<'_> {
    fn default() -> Self {
        Self {
            epochs: 1,
            batch_size: 32,
            shuffle: true,
            seed: 0,
            validation_data: None,
        }
    }
}

/// evaluate 的结果；空数据集时损失与准确率均为 None
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub loss: Option<f32>,
    pub accuracy: Option<f32>,
    pub samples: usize,
}

impl Evaluation {
    pub const fn empty() -> Self {
        Self {
            loss: None,
            accuracy: None,
            samples: 0,
        }
    }
}

/// 可训练、可推理、可保存的模型
pub trait Model {
    fn fit(
        &mut self,
        train: &TensorDataset,
        options: &FitOptions<'_>,
        callbacks: &mut [&mut dyn TrainingCallback],
    ) -> Result<History, ModelError>;

    /// 输入形状 [N, ...]，输出形状 [N, num_classes]
    fn predict(&self, x: &Tensor) -> Result<Tensor, ModelError>;

    fn evaluate(&self, x: &Tensor, y: &Tensor) -> Result<Evaluation, ModelError>;

    fn save(&self, path: &Path) -> Result<(), ModelError>;

    fn summary(&self) -> String;

    fn num_params(&self) -> usize;
}
