/*
 * @Author       : 老董
 * @Description  : 训练流水线配置（JSON，缺省字段取默认值）
 */

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::PipelineError;

/// 训练流水线配置
///
/// # 示例
/// ```ignore
/// let config = TrainingConfig::load("train.json").unwrap_or_default();
/// println!("epochs={}, batch_size={}", config.epochs, config.batch_size);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// 实验名（不存在时自动创建）
    pub experiment_name: String,
    pub epochs: usize,
    /// 1 表示逐样本更新
    pub batch_size: usize,
    pub hidden_units: usize,
    pub num_classes: usize,
    pub learning_rate: f32,
    /// 权重初始化与每个 epoch 的打乱都由它派生
    pub seed: u64,
    pub shuffle: bool,
    /// 本地模型文件
    pub model_path: PathBuf,
    /// 模型在 run artifact 中的目录
    pub artifact_path: String,
    /// 每隔多少个 epoch 记录一次指标
    pub autolog_every_n_iter: usize,
    /// None 时使用默认缓存目录
    pub data_dir: Option<PathBuf>,
    pub download: bool,
    /// 只取训练集前 N 个样本
    pub train_limit: Option<usize>,
    pub test_limit: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            experiment_name: "MLtestped MNIST".to_string(),
            epochs: 5,
            batch_size: 1,
            hidden_units: 128,
            num_classes: 10,
            learning_rate: 0.001,
            seed: 42,
            shuffle: true,
            model_path: PathBuf::from("mnist_model_5epochs.mntm"),
            artifact_path: "mnist_tensorflow_malli".to_string(),
            autolog_every_n_iter: 1,
            data_dir: None,
            download: true,
            train_limit: None,
            test_limit: None,
        }
    }
}

impl TrainingConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let positive = [
            ("epochs", self.epochs),
            ("batch_size", self.batch_size),
            ("hidden_units", self.hidden_units),
            ("num_classes", self.num_classes),
            ("autolog_every_n_iter", self.autolog_every_n_iter),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(PipelineError::Config(format!("{name}须大于0")));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PipelineError::Config(format!(
                "learning_rate须为正数，实际为 {}",
                self.learning_rate
            )));
        }
        if self.experiment_name.trim().is_empty() {
            return Err(PipelineError::Config("experiment_name不能为空".to_string()));
        }
        if self.artifact_path.trim().is_empty() {
            return Err(PipelineError::Config("artifact_path不能为空".to_string()));
        }
        Ok(())
    }
}
