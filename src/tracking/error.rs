//! 实验追踪错误类型定义

use thiserror::Error;

use crate::signature::SignatureError;

/// 实验追踪相关错误
#[derive(Debug, Error)]
pub enum TrackingError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 编解码错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 追踪服务返回错误或无法访问
    #[error("追踪服务请求失败（状态码 {status:?}）: {message}")]
    Http { status: Option<u16>, message: String },

    /// 当前状态不允许该操作（如向已结束的 run 写入、修改已记录的参数）
    #[error("状态错误: {0}")]
    InvalidState(String),

    /// 实验或 run 不存在
    #[error("未找到: {0}")]
    NotFound(String),

    /// 参数/指标/标签名或 artifact 路径不合法
    #[error("非法的名称或路径: {0}")]
    InvalidKey(String),

    /// 模型签名无法编码
    #[error(transparent)]
    Signature(#[from] SignatureError),
}
