/*
 * @Author       : 老董
 * @Description  : 通过 MLflow REST API 2.0 访问远程追踪服务
 */

use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::store::{
    Experiment, Metric, RunData, RunInfo, RunRecord, RunStatus, TrackingStore, validate_key,
    validate_relative_path,
};
use super::TrackingError;

const API_PREFIX: &str = "api/2.0/mlflow";
const ARTIFACTS_PREFIX: &str = "api/2.0/mlflow-artifacts/artifacts";
const PROXY_SCHEME: &str = "mlflow-artifacts:";

pub struct RestStore {
    base_url: String,
    agent: ureq::Agent,
}

impl RestStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{path}", self.base_url)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, TrackingError> {
        let response = self
            .agent
            .post(&self.endpoint(path))
            .send_json(body)
            .map_err(http_error)?;
        read_json(response)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, TrackingError> {
        let mut request = self.agent.get(&self.endpoint(path));
        for &(key, value) in query {
            request = request.query(key, value);
        }
        read_json(request.call().map_err(http_error)?)
    }

    /// artifact_uri 为 `mlflow-artifacts:` 时经服务端代理上传，否则视为服务端与本机共享的目录
    fn upload_artifact(&self, artifact_uri: &str, path: &str, contents: &[u8]) -> Result<(), TrackingError> {
        if let Some(rest) = artifact_uri.strip_prefix(PROXY_SCHEME) {
            let url = format!(
                "{}/{ARTIFACTS_PREFIX}/{}/{path}",
                self.base_url,
                rest.trim_start_matches('/')
            );
            self.agent
                .put(&url)
                .set("Content-Type", "application/octet-stream")
                .send_bytes(contents)
                .map_err(http_error)?;
            return Ok(());
        }

        let root = artifact_uri.strip_prefix("file://").unwrap_or(artifact_uri);
        let dest = std::path::Path::new(root).join(path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, contents)?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T, TrackingError> {
    let mut body = String::new();
    response.into_reader().read_to_string(&mut body)?;
    // 部分接口成功时返回空对象
    if body.trim().is_empty() {
        body = "{}".to_string();
    }
    Ok(serde_json::from_str(&body)?)
}

fn http_error(err: ureq::Error) -> TrackingError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let error_code = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error_code"].as_str().map(str::to_string));
            if status == 404 || error_code.as_deref() == Some("RESOURCE_DOES_NOT_EXIST") {
                TrackingError::NotFound(body)
            } else {
                TrackingError::Http {
                    status: Some(status),
                    message: body,
                }
            }
        }
        ureq::Error::Transport(transport) => TrackingError::Http {
            status: None,
            message: transport.to_string(),
        },
    }
}

#[derive(Deserialize)]
struct ExperimentResponse {
    experiment: RestExperiment,
}

#[derive(Deserialize)]
struct RestExperiment {
    experiment_id: String,
    name: String,
    #[serde(default)]
    artifact_location: String,
    #[serde(default)]
    creation_time: Option<i64>,
}

#[derive(Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Deserialize)]
struct RunResponse {
    run: RestRun,
}

#[derive(Deserialize)]
struct RestRun {
    info: RestRunInfo,
    #[serde(default)]
    data: RestRunData,
}

#[derive(Deserialize)]
struct UpdateRunResponse {
    run_info: RestRunInfo,
}

#[derive(Deserialize)]
struct RestRunInfo {
    run_id: String,
    experiment_id: String,
    #[serde(default)]
    run_name: Option<String>,
    status: RunStatus,
    #[serde(default)]
    start_time: Option<i64>,
    #[serde(default)]
    end_time: Option<i64>,
    #[serde(default)]
    artifact_uri: String,
}

#[derive(Deserialize, Default)]
struct RestRunData {
    #[serde(default)]
    metrics: Vec<Metric>,
    #[serde(default)]
    params: Vec<KeyValue>,
    #[serde(default)]
    tags: Vec<KeyValue>,
}

#[derive(Deserialize)]
struct KeyValue {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct MetricHistoryResponse {
    #[serde(default)]
    metrics: Vec<Metric>,
}

impl From<RestRunInfo> for RunInfo {
    fn from(info: RestRunInfo) -> Self {
        Self {
            run_id: info.run_id,
            experiment_id: info.experiment_id,
            run_name: info.run_name,
            status: info.status,
            start_time: info.start_time.unwrap_or_default(),
            end_time: info.end_time,
            artifact_uri: info.artifact_uri,
        }
    }
}

impl From<RestExperiment> for Experiment {
    fn from(experiment: RestExperiment) -> Self {
        Self {
            experiment_id: experiment.experiment_id,
            name: experiment.name,
            artifact_location: experiment.artifact_location,
            creation_time: experiment.creation_time.unwrap_or_default(),
        }
    }
}

fn to_map(pairs: Vec<KeyValue>) -> BTreeMap<String, String> {
    pairs.into_iter().map(|kv| (kv.key, kv.value)).collect()
}

impl TrackingStore for RestStore {
    fn uri(&self) -> String {
        self.base_url.clone()
    }

    fn get_or_create_experiment(&self, name: &str) -> Result<Experiment, TrackingError> {
        match self.get::<ExperimentResponse>("experiments/get-by-name", &[("experiment_name", name)]) {
            Ok(response) => return Ok(response.experiment.into()),
            Err(TrackingError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let created: CreateExperimentResponse =
            self.post("experiments/create", json!({ "name": name }))?;
        log::debug!("创建实验 {name}（id={}）", created.experiment_id);
        let response: ExperimentResponse = self.get(
            "experiments/get",
            &[("experiment_id", created.experiment_id.as_str())],
        )?;
        Ok(response.experiment.into())
    }

    fn create_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
        start_time: i64,
    ) -> Result<RunInfo, TrackingError> {
        let mut body = json!({ "experiment_id": experiment_id, "start_time": start_time });
        if let Some(name) = run_name {
            body["run_name"] = json!(name);
        }
        let response: RunResponse = self.post("runs/create", body)?;
        Ok(response.run.info.into())
    }

    fn update_run(
        &self,
        run_id: &str,
        status: RunStatus,
        end_time: Option<i64>,
    ) -> Result<RunInfo, TrackingError> {
        let mut body = json!({ "run_id": run_id, "status": status.as_str() });
        if let Some(end_time) = end_time {
            body["end_time"] = json!(end_time);
        }
        let response: UpdateRunResponse = self.post("runs/update", body)?;
        Ok(response.run_info.into())
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<(), TrackingError> {
        validate_key(key)?;
        self.post::<Value>(
            "runs/log-parameter",
            json!({ "run_id": run_id, "key": key, "value": value }),
        )?;
        Ok(())
    }

    fn log_metric(&self, run_id: &str, metric: &Metric) -> Result<(), TrackingError> {
        validate_key(&metric.key)?;
        let mut body = serde_json::to_value(metric)?;
        body["run_id"] = json!(run_id);
        self.post::<Value>("runs/log-metric", body)?;
        Ok(())
    }

    fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<(), TrackingError> {
        validate_key(key)?;
        self.post::<Value>(
            "runs/set-tag",
            json!({ "run_id": run_id, "key": key, "value": value }),
        )?;
        Ok(())
    }

    fn log_artifact(
        &self,
        run_id: &str,
        path: &str,
        contents: &[u8],
    ) -> Result<(), TrackingError> {
        validate_relative_path(path)?;
        let info = self.get_run(run_id)?.info;
        if info.status.is_terminated() {
            return Err(TrackingError::InvalidState(format!("run {run_id} 已结束")));
        }
        self.upload_artifact(&info.artifact_uri, path, contents)?;
        log::debug!("上传 artifact {path}（{} 字节）", contents.len());
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> Result<RunRecord, TrackingError> {
        let response: RunResponse = self.get("runs/get", &[("run_id", run_id)])?;
        let RestRun { info, data } = response.run;

        let mut metrics = BTreeMap::new();
        for metric in data.metrics {
            metrics.insert(metric.key, metric.value);
        }
        Ok(RunRecord {
            info: info.into(),
            data: RunData {
                params: to_map(data.params),
                metrics,
                tags: to_map(data.tags),
            },
        })
    }

    fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<Metric>, TrackingError> {
        let response: MetricHistoryResponse = self.get(
            "metrics/get-history",
            &[("run_id", run_id), ("metric_key", key)],
        )?;
        Ok(response.metrics)
    }
}
