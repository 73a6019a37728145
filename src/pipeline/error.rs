//! 训练流水线错误类型定义

use thiserror::Error;

use crate::data::DataError;
use crate::nn::ModelError;
use crate::signature::SignatureError;
use crate::tracking::TrackingError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("数据加载失败: {0}")]
    Data(#[from] DataError),

    #[error("模型错误: {0}")]
    Model(#[from] ModelError),

    #[error("实验追踪失败: {0}")]
    Tracking(#[from] TrackingError),

    #[error("签名推断失败: {0}")]
    Signature(#[from] SignatureError),

    #[error("配置无效: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置解析失败: {0}")]
    Json(#[from] serde_json::Error),
}
