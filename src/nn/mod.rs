/*
 * @Author       : 老董
 * @Description  : 神经网络：层、优化器、损失/指标、训练回调与顺序模型
 */

mod callback;
mod criterion;
mod error;
pub mod layer;
mod model;
pub mod optimizer;
mod sequential;
mod serialization;

pub use callback::{EpochLogs, History, TrainBegin, TrainingCallback};
pub use criterion::{Loss, Metric, PROB_EPSILON};
pub use error::ModelError;
pub use layer::{Activation, Dense, Flatten, Layer, LayerKind};
pub use model::{CompileOptions, Evaluation, FitOptions, Model};
pub use optimizer::{Adam, Optimizer, OptimizerConfig};
pub use sequential::{BatchStats, INFERENCE_BATCH_SIZE, Sequential};
pub use serialization::MODEL_FILE_EXTENSION;

#[cfg(test)]
mod tests;
