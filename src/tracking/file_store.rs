/*
 * @Author       : 老董
 * @Description  : 本地目录追踪后端
 *
 * 目录布局：
 * <root>/<experiment_id>/meta.json
 * <root>/<experiment_id>/<run_id>/meta.json
 * <root>/<experiment_id>/<run_id>/params/<key>      参数值文本
 * <root>/<experiment_id>/<run_id>/metrics/<key>     每行 `<timestamp> <value> <step>`
 * <root>/<experiment_id>/<run_id>/tags/<key>        标签值文本
 * <root>/<experiment_id>/<run_id>/artifacts/...
 */

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::store::{
    Experiment, Metric, RunData, RunInfo, RunRecord, RunStatus, TrackingStore, now_millis,
    validate_key, validate_relative_path,
};
use super::TrackingError;

const META_FILE: &str = "meta.json";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// 以`root`为根目录，目录不存在时创建
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, TrackingError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 所有实验，按 id 升序
    pub fn list_experiments(&self) -> Result<Vec<Experiment>, TrackingError> {
        let mut experiments = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let meta = path.join(META_FILE);
            let is_experiment_dir = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.parse::<u64>().is_ok());
            if is_experiment_dir && meta.is_file() {
                experiments.push(read_json::<Experiment>(&meta)?);
            }
        }
        experiments.sort_by_key(|e| e.experiment_id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(experiments)
    }

    fn run_dir(&self, run_id: &str) -> Result<PathBuf, TrackingError> {
        validate_relative_path(run_id)?;
        for experiment in self.list_experiments()? {
            let dir = self.root.join(&experiment.experiment_id).join(run_id);
            if dir.join(META_FILE).is_file() {
                return Ok(dir);
            }
        }
        Err(TrackingError::NotFound(format!("run {run_id}")))
    }

    /// 定位 run 目录并确认 run 仍在进行
    fn active_run_dir(&self, run_id: &str) -> Result<PathBuf, TrackingError> {
        let dir = self.run_dir(run_id)?;
        let info: RunInfo = read_json(&dir.join(META_FILE))?;
        if info.status.is_terminated() {
            return Err(TrackingError::InvalidState(format!(
                "run {run_id} 已结束（{}）",
                info.status.as_str()
            )));
        }
        Ok(dir)
    }
}

impl TrackingStore for FileStore {
    fn uri(&self) -> String {
        self.root.display().to_string()
    }

    fn get_or_create_experiment(&self, name: &str) -> Result<Experiment, TrackingError> {
        if name.trim().is_empty() {
            return Err(TrackingError::InvalidKey("实验名为空".to_string()));
        }
        let experiments = self.list_experiments()?;
        if let Some(existing) = experiments.iter().find(|e| e.name == name) {
            return Ok(existing.clone());
        }

        let next_id = experiments
            .iter()
            .filter_map(|e| e.experiment_id.parse::<u64>().ok())
            .max()
            .map_or(0, |id| id + 1);
        let dir = self.root.join(next_id.to_string());
        fs::create_dir_all(&dir)?;
        let experiment = Experiment {
            experiment_id: next_id.to_string(),
            name: name.to_string(),
            artifact_location: dir.display().to_string(),
            creation_time: now_millis(),
        };
        write_json(&dir.join(META_FILE), &experiment)?;
        log::debug!("创建实验 {name}（id={next_id}）");
        Ok(experiment)
    }

    fn create_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
        start_time: i64,
    ) -> Result<RunInfo, TrackingError> {
        validate_relative_path(experiment_id)?;
        let experiment_dir = self.root.join(experiment_id);
        if !experiment_dir.join(META_FILE).is_file() {
            return Err(TrackingError::NotFound(format!("实验 {experiment_id}")));
        }

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let run_dir = experiment_dir.join(&run_id);
        for sub in ["params", "metrics", "tags", "artifacts"] {
            fs::create_dir_all(run_dir.join(sub))?;
        }
        let info = RunInfo {
            run_id,
            experiment_id: experiment_id.to_string(),
            run_name: run_name.map(str::to_string),
            status: RunStatus::Running,
            start_time,
            end_time: None,
            artifact_uri: run_dir.join("artifacts").display().to_string(),
        };
        write_json(&run_dir.join(META_FILE), &info)?;
        if let Some(name) = run_name {
            fs::write(run_dir.join("tags").join("mlflow.runName"), name)?;
        }
        Ok(info)
    }

    fn update_run(
        &self,
        run_id: &str,
        status: RunStatus,
        end_time: Option<i64>,
    ) -> Result<RunInfo, TrackingError> {
        let meta = self.run_dir(run_id)?.join(META_FILE);
        let mut info: RunInfo = read_json(&meta)?;
        if info.status.is_terminated() {
            return Err(TrackingError::InvalidState(format!(
                "run {run_id} 已结束（{}）",
                info.status.as_str()
            )));
        }
        info.status = status;
        info.end_time = end_time;
        write_json(&meta, &info)?;
        Ok(info)
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<(), TrackingError> {
        validate_key(key)?;
        let path = self.active_run_dir(run_id)?.join("params").join(key);
        if path.is_file() {
            let existing = fs::read_to_string(&path)?;
            if existing == value {
                return Ok(());
            }
            return Err(TrackingError::InvalidState(format!(
                "参数 {key} 已记录为 {existing}，不能改为 {value}"
            )));
        }
        write_file(&path, value.as_bytes())
    }

    fn log_metric(&self, run_id: &str, metric: &Metric) -> Result<(), TrackingError> {
        validate_key(&metric.key)?;
        let path = self.active_run_dir(run_id)?.join("metrics").join(&metric.key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{} {} {}", metric.timestamp, metric.value, metric.step)?;
        Ok(())
    }

    fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<(), TrackingError> {
        validate_key(key)?;
        let path = self.active_run_dir(run_id)?.join("tags").join(key);
        write_file(&path, value.as_bytes())
    }

    fn log_artifact(
        &self,
        run_id: &str,
        path: &str,
        contents: &[u8],
    ) -> Result<(), TrackingError> {
        validate_relative_path(path)?;
        let dest = self.active_run_dir(run_id)?.join("artifacts").join(path);
        write_file(&dest, contents)
    }

    fn get_run(&self, run_id: &str) -> Result<RunRecord, TrackingError> {
        let dir = self.run_dir(run_id)?;
        let info = read_json(&dir.join(META_FILE))?;

        let mut metrics = BTreeMap::new();
        for (key, text) in read_key_files(&dir.join("metrics"))? {
            if let Some(last) = parse_metric_lines(&key, &text)?.pop() {
                metrics.insert(key, last.value);
            }
        }

        Ok(RunRecord {
            info,
            data: RunData {
                params: read_key_files(&dir.join("params"))?,
                metrics,
                tags: read_key_files(&dir.join("tags"))?,
            },
        })
    }

    fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<Metric>, TrackingError> {
        validate_key(key)?;
        let path = self.run_dir(run_id)?.join("metrics").join(key);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        parse_metric_lines(key, &fs::read_to_string(path)?)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TrackingError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), TrackingError> {
    write_file(path, serde_json::to_string_pretty(value)?.as_bytes())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), TrackingError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// 递归读取目录下的所有文件，键为以`/`连接的相对路径
fn read_key_files(dir: &Path) -> Result<BTreeMap<String, String>, TrackingError> {
    let mut files = BTreeMap::new();
    if dir.is_dir() {
        collect_key_files(dir, "", &mut files)?;
    }
    Ok(files)
}

fn collect_key_files(
    dir: &Path,
    prefix: &str,
    files: &mut BTreeMap<String, String>,
) -> Result<(), TrackingError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let key = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        if path.is_dir() {
            collect_key_files(&path, &key, files)?;
        } else {
            files.insert(key, fs::read_to_string(&path)?);
        }
    }
    Ok(())
}

fn parse_metric_lines(key: &str, text: &str) -> Result<Vec<Metric>, TrackingError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let bad_line = || TrackingError::InvalidState(format!("指标 {key} 的记录损坏: {line}"));
            let mut fields = line.split_whitespace();
            let timestamp = fields.next().and_then(|v| v.parse().ok()).ok_or_else(bad_line)?;
            let value = fields.next().and_then(|v| v.parse().ok()).ok_or_else(bad_line)?;
            let step = fields.next().and_then(|v| v.parse().ok()).ok_or_else(bad_line)?;
            Ok(Metric {
                key: key.to_string(),
                value,
                timestamp,
                step,
            })
        })
        .collect()
}
