/*
 * @Author       : 老董
 * @Description  : 实验追踪：实验、run、参数、指标、标签与 artifact
 *
 * 后端由 `MLFLOW_TRACKING_URI` 决定：`http(s)://` 走 MLflow REST API，
 * 其余情况写入本地目录（默认 `./mlruns`）。run 句柄显式传递，不存在进程级的“当前 run”。
 */

mod autolog;
mod client;
mod error;
mod file_store;
mod model_log;
mod rest_store;
mod store;

pub use autolog::{AutologCallback, MODEL_SUMMARY_ARTIFACT};
pub use client::{DEFAULT_TRACKING_DIR, Run, TRACKING_URI_ENV, TrackingClient};
pub use error::TrackingError;
pub use file_store::FileStore;
pub use model_log::{FLAVOR_NAME, LOG_MODEL_HISTORY_TAG, MLMODEL_FILE, MlModel, ModelFlavor, log_model};
pub use rest_store::RestStore;
pub use store::{
    Experiment, Metric, RunData, RunInfo, RunRecord, RunStatus, TrackingStore, now_millis,
    validate_key, validate_relative_path,
};

#[cfg(test)]
mod tests;
