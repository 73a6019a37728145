/*
 * @Author       : 老董
 * @Description  : 将模型文件、签名及元数据记录为 run 的 artifact
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::{now_millis, validate_relative_path};
use super::{Run, TrackingError};
use crate::nn::MODEL_FILE_EXTENSION;
use crate::signature::{ModelSignature, SignatureRecord};

/// 模型元数据文件名
pub const MLMODEL_FILE: &str = "MLmodel";
/// 记录模型历史的标签
pub const LOG_MODEL_HISTORY_TAG: &str = "mlflow.log-model.history";
/// 元数据中的 flavor 名
pub const FLAVOR_NAME: &str = "mnist_track";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFlavor {
    /// 相对于模型目录的模型文件路径
    pub data: String,
    pub format: String,
    pub crate_version: String,
}

/// `<artifact_path>/MLmodel` 的内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlModel {
    pub artifact_path: String,
    pub run_id: String,
    pub model_uuid: String,
    /// 毫秒时间戳
    pub utc_time_created: i64,
    pub model_size_bytes: usize,
    pub flavors: std::collections::BTreeMap<String, ModelFlavor>,
    pub signature: SignatureRecord,
}

impl MlModel {
    /// 模型文件在 run artifact 中的完整路径
    pub fn model_file(&self) -> Option<String> {
        self.flavors
            .get(FLAVOR_NAME)
            .map(|f| format!("{}/{}", self.artifact_path, f.data))
    }
}

/// 在`artifact_path`下写入 MLmodel 与 `data/model.mntm`，并追加模型历史标签
pub fn log_model(
    run: &Run<'_>,
    artifact_path: &str,
    model_bytes: &[u8],
    signature: &ModelSignature,
) -> Result<MlModel, TrackingError> {
    validate_relative_path(artifact_path)?;
    let data = format!("data/model.{MODEL_FILE_EXTENSION}");
    let flavor = ModelFlavor {
        data: data.clone(),
        format: MODEL_FILE_EXTENSION.to_string(),
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let mlmodel = MlModel {
        artifact_path: artifact_path.to_string(),
        run_id: run.run_id().to_string(),
        model_uuid: uuid::Uuid::new_v4().simple().to_string(),
        utc_time_created: now_millis(),
        model_size_bytes: model_bytes.len(),
        flavors: [(FLAVOR_NAME.to_string(), flavor)].into_iter().collect(),
        signature: signature.to_record()?,
    };

    run.log_artifact(&format!("{artifact_path}/{data}"), model_bytes)?;
    run.log_text(
        &format!("{artifact_path}/{MLMODEL_FILE}"),
        &serde_json::to_string_pretty(&mlmodel)?,
    )?;

    // 同一 run 可多次记录模型，历史按记录顺序追加
    let mut history = run
        .store()
        .get_run(run.run_id())?
        .data
        .tags
        .get(LOG_MODEL_HISTORY_TAG)
        .and_then(|v| serde_json::from_str::<Vec<Value>>(v).ok())
        .unwrap_or_default();
    history.push(serde_json::to_value(&mlmodel)?);
    run.set_tag(LOG_MODEL_HISTORY_TAG, &serde_json::to_string(&history)?)?;

    log::info!(
        "模型已记录到 run {} 的 {artifact_path}（{} 字节）",
        run.run_id(),
        model_bytes.len()
    );
    Ok(mlmodel)
}
