/*
 * @Author       : 老董
 * @Description  : 追踪客户端与显式的 run 句柄
 */

use std::fmt::Display;
use std::path::PathBuf;

use super::store::{Experiment, Metric, RunInfo, RunRecord, RunStatus, TrackingStore, now_millis};
use super::{FileStore, RestStore, TrackingError};

/// 指定追踪后端的环境变量
pub const TRACKING_URI_ENV: &str = "MLFLOW_TRACKING_URI";
/// 未指定追踪后端时使用的本地目录
pub const DEFAULT_TRACKING_DIR: &str = "mlruns";

pub struct TrackingClient {
    store: Box<dyn TrackingStore>,
}

impl TrackingClient {
    pub fn new(store: Box<dyn TrackingStore>) -> Self {
        Self { store }
    }

    /// `http(s)://` 开头时使用远程服务，否则视为本地目录（可带 `file://` 前缀；为空时用 `./mlruns`）
    pub fn from_uri(uri: &str) -> Result<Self, TrackingError> {
        let uri = uri.trim();
        let store: Box<dyn TrackingStore> =
            if uri.starts_with("http://") || uri.starts_with("https://") {
                Box::new(RestStore::new(uri))
            } else {
                let path = uri.strip_prefix("file://").unwrap_or(uri);
                let root = if path.is_empty() {
                    PathBuf::from(DEFAULT_TRACKING_DIR)
                } else {
                    PathBuf::from(path)
                };
                Box::new(FileStore::new(root)?)
            };
        log::info!("实验追踪后端: {}", store.uri());
        Ok(Self { store })
    }

    /// 读取 `MLFLOW_TRACKING_URI`
    pub fn from_env() -> Result<Self, TrackingError> {
        Self::from_uri(&std::env::var(TRACKING_URI_ENV).unwrap_or_default())
    }

    pub fn store(&self) -> &dyn TrackingStore {
        self.store.as_ref()
    }

    pub fn uri(&self) -> String {
        self.store.uri()
    }

    /// 按名称获取实验，不存在则创建
    pub fn set_experiment(&self, name: &str) -> Result<Experiment, TrackingError> {
        self.store.get_or_create_experiment(name)
    }

    pub fn start_run(
        &self,
        experiment: &Experiment,
        run_name: Option<&str>,
    ) -> Result<Run<'_>, TrackingError> {
        let info = self
            .store
            .create_run(&experiment.experiment_id, run_name, now_millis())?;
        log::info!(
            "开始 run {}（实验 {}）",
            info.run_id,
            experiment.name
        );
        Ok(Run {
            store: self.store.as_ref(),
            info,
            ended: false,
        })
    }

    pub fn get_run(&self, run_id: &str) -> Result<RunRecord, TrackingError> {
        self.store.get_run(run_id)
    }
}

/// 进行中的 run
///
/// 必须调用 [`Run::end`] 结束；未结束就被丢弃时按 `FAILED` 处理。
pub struct Run<'a> {
    store: &'a dyn TrackingStore,
    info: RunInfo,
    ended: bool,
}

impl Run<'_> {
    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    pub fn run_id(&self) -> &str {
        &self.info.run_id
    }

    pub fn store(&self) -> &dyn TrackingStore {
        self.store
    }

    pub fn log_param(&self, key: &str, value: impl Display) -> Result<(), TrackingError> {
        self.store.log_param(&self.info.run_id, key, &value.to_string())
    }

    pub fn log_params<I, K, V>(&self, params: I) -> Result<(), TrackingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        for (key, value) in params {
            self.log_param(key.as_ref(), value)?;
        }
        Ok(())
    }

    pub fn log_metric(&self, key: &str, value: f64, step: i64) -> Result<(), TrackingError> {
        let metric = Metric {
            key: key.to_string(),
            value,
            timestamp: now_millis(),
            step,
        };
        self.store.log_metric(&self.info.run_id, &metric)
    }

    pub fn set_tag(&self, key: &str, value: &str) -> Result<(), TrackingError> {
        self.store.set_tag(&self.info.run_id, key, value)
    }

    pub fn log_artifact(&self, path: &str, contents: &[u8]) -> Result<(), TrackingError> {
        self.store.log_artifact(&self.info.run_id, path, contents)
    }

    pub fn log_text(&self, path: &str, text: &str) -> Result<(), TrackingError> {
        self.log_artifact(path, text.as_bytes())
    }

    /// 结束 run 并记录结束时间
    pub fn end(mut self, status: RunStatus) -> Result<RunInfo, TrackingError> {
        self.ended = true;
        let info = self
            .store
            .update_run(&self.info.run_id, status, Some(now_millis()))?;
        log::info!("run {} 已结束: {}", info.run_id, status.as_str());
        Ok(info)
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        log::warn!("run {} 未正常结束，标记为 FAILED", self.info.run_id);
        if let Err(e) = self
            .store
            .update_run(&self.info.run_id, RunStatus::Failed, Some(now_millis()))
        {
            log::warn!("标记 run {} 失败: {e}", self.info.run_id);
        }
    }
}
