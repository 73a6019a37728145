/*
 * @Author       : 老董
 * @Description  : 追踪后端的统一接口及其数据类型
 */

use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::TrackingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    pub artifact_location: String,
    /// 毫秒时间戳
    pub creation_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Scheduled,
    Finished,
    Failed,
    Killed,
}

impl RunStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Scheduled => "SCHEDULED",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        }
    }

    pub const fn is_terminated(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Killed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment_id: String,
    pub run_name: Option<String>,
    pub status: RunStatus,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub artifact_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    #[serde(with = "metric_value")]
    pub value: f64,
    /// 毫秒时间戳
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub step: i64,
}

/// 非有限的指标值在 JSON 中写作 "NaN"、"Infinity"、"-Infinity"
mod metric_value {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("无效的指标值: {other}"))),
            },
        }
    }
}

/// run 的已记录内容；metrics 只保留每个指标最后一次记录的值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunData {
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub info: RunInfo,
    pub data: RunData,
}

/// 追踪后端（本地目录或远程服务）
///
/// 所有方法只需`&self`：后端本身不持有可变的会话状态。
pub trait TrackingStore {
    /// 后端地址，用于日志输出
    fn uri(&self) -> String;

    /// 按名称查找实验，不存在则创建
    fn get_or_create_experiment(&self, name: &str) -> Result<Experiment, TrackingError>;

    fn create_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
        start_time: i64,
    ) -> Result<RunInfo, TrackingError>;

    fn update_run(
        &self,
        run_id: &str,
        status: RunStatus,
        end_time: Option<i64>,
    ) -> Result<RunInfo, TrackingError>;

    /// 同一 run 中的参数只能记录一次；以相同的值重复记录视为成功
    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<(), TrackingError>;

    fn log_metric(&self, run_id: &str, metric: &Metric) -> Result<(), TrackingError>;

    fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<(), TrackingError>;

    /// 将`contents`保存为 run 的 artifact，`path`为相对于 artifact 根目录的路径
    fn log_artifact(&self, run_id: &str, path: &str, contents: &[u8])
    -> Result<(), TrackingError>;

    fn get_run(&self, run_id: &str) -> Result<RunRecord, TrackingError>;

    fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<Metric>, TrackingError>;
}

/// 当前毫秒时间戳
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

/// 参数/指标/标签名：非空，只含字母数字与 `_ - . / 空格`，不能是绝对路径或含 `..`
pub fn validate_key(key: &str) -> Result<(), TrackingError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ' ');
    if key.is_empty() || !key.chars().all(allowed) {
        return Err(TrackingError::InvalidKey(key.to_string()));
    }
    validate_relative_path(key)
}

/// artifact 路径：非空的相对路径，不含 `..`
pub fn validate_relative_path(path: &str) -> Result<(), TrackingError> {
    let valid = !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !valid {
        return Err(TrackingError::InvalidKey(path.to_string()));
    }
    Ok(())
}
