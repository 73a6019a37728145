/*
 * @Author       : 老董
 * @Description  : 模型构建、训练、推理与保存的错误类型
 */

use thiserror::Error;

use crate::data::DataError;
use crate::errors::TensorError;

/// 模型操作错误类型
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("模型尚未编译，请先调用 compile()")]
    NotCompiled,
    #[error("模型已编译，不支持重新配置")]
    AlreadyCompiled,
    #[error("模型不含任何层")]
    NoLayers,
    #[error("形状不匹配（{message}）：期望 {expected:?}，实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("训练集为空")]
    EmptyDataset,
    #[error("无效的参数：{0}")]
    InvalidArgument(String),
    #[error("模型文件格式错误：{0}")]
    InvalidFormat(String),
    #[error("模型文件读写失败：{0}")]
    Io(#[from] std::io::Error),
    #[error("模型序列化失败：{0}")]
    Serialization(#[from] bincode::Error),
    #[error("训练回调失败：{0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Tensor(#[from] TensorError),
    #[error(transparent)]
    Data(#[from] DataError),
}
