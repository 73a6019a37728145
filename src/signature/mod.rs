/*
 * @Author       : 老董
 * @Description  : 模型签名：输入/输出张量的 dtype 与形状（batch 维记为 -1）
 *
 * 序列化布局与 MLflow 一致：
 * {"inputs": "[{\"type\": \"tensor\", \"tensor-spec\": {...}}]", "outputs": "..."}
 * 即 inputs/outputs 各自是一段 JSON 文本。
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tensor::Tensor;

#[cfg(test)]
mod tests;

/// 当前张量的元素类型
pub const FLOAT32: &str = "float32";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("{what} 至少须为一维（含 batch 维度），实际形状 {shape:?}")]
    MissingBatchDimension { what: &'static str, shape: Vec<usize> },
    #[error("输入与签名不符：期望 {expected:?}，实际 {got:?}")]
    InputMismatch { expected: Vec<i64>, got: Vec<usize> },
    #[error("签名不含输入定义")]
    NoInputs,
    #[error("签名格式错误：{0}")]
    InvalidFormat(String),
    #[error("签名JSON解析失败：{0}")]
    Json(#[from] serde_json::Error),
}

/// 单个张量的规格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub dtype: String,
    /// -1 表示任意长度（batch 维度）
    pub shape: Vec<i64>,
}

impl TensorSpec {
    /// 由一批数据推断：第一维替换为 -1
    pub fn from_batch(tensor: &Tensor, what: &'static str) -> Result<Self, SignatureError> {
        let shape = tensor.shape();
        if shape.is_empty() {
            return Err(SignatureError::MissingBatchDimension {
                what,
                shape: shape.to_vec(),
            });
        }
        let mut dims = vec![-1];
        dims.extend(shape[1..].iter().map(|&d| d as i64));
        Ok(Self {
            dtype: FLOAT32.to_string(),
            shape: dims,
        })
    }

    /// 形状是否与该规格兼容
    pub fn matches(&self, shape: &[usize]) -> bool {
        self.shape.len() == shape.len()
            && self
                .shape
                .iter()
                .zip(shape)
                .all(|(&spec, &dim)| spec == -1 || spec == dim as i64)
    }
}

#[derive(Serialize, Deserialize)]
struct TensorSpecEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "tensor-spec")]
    spec: TensorSpec,
}

/// MLmodel 文件中的签名字段（inputs/outputs 为 JSON 文本）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub inputs: String,
    pub outputs: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSignature {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

/// 根据一批样例输入和对应的模型输出推断签名
pub fn infer_signature(inputs: &Tensor, outputs: &Tensor) -> Result<ModelSignature, SignatureError> {
    Ok(ModelSignature {
        inputs: vec![TensorSpec::from_batch(inputs, "输入")?],
        outputs: vec![TensorSpec::from_batch(outputs, "输出")?],
    })
}

impl ModelSignature {
    pub fn to_record(&self) -> Result<SignatureRecord, SignatureError> {
        Ok(SignatureRecord {
            inputs: specs_to_json(&self.inputs)?,
            outputs: specs_to_json(&self.outputs)?,
        })
    }

    pub fn from_record(record: &SignatureRecord) -> Result<Self, SignatureError> {
        Ok(Self {
            inputs: specs_from_json(&record.inputs)?,
            outputs: specs_from_json(&record.outputs)?,
        })
    }

    pub fn to_json(&self) -> Result<String, SignatureError> {
        Ok(serde_json::to_string(&self.to_record()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SignatureError> {
        let record: SignatureRecord = serde_json::from_str(json)?;
        Self::from_record(&record)
    }

    /// 检查一批输入是否符合签名中的第一个输入规格
    pub fn validate_input(&self, x: &Tensor) -> Result<(), SignatureError> {
        let spec = self.inputs.first().ok_or(SignatureError::NoInputs)?;
        if !spec.matches(x.shape()) {
            return Err(SignatureError::InputMismatch {
                expected: spec.shape.clone(),
                got: x.shape().to_vec(),
            });
        }
        Ok(())
    }
}

fn specs_to_json(specs: &[TensorSpec]) -> Result<String, SignatureError> {
    let entries: Vec<TensorSpecEntry> = specs
        .iter()
        .map(|spec| TensorSpecEntry {
            kind: "tensor".to_string(),
            spec: spec.clone(),
        })
        .collect();
    Ok(serde_json::to_string(&entries)?)
}

fn specs_from_json(json: &str) -> Result<Vec<TensorSpec>, SignatureError> {
    let entries: Vec<TensorSpecEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .map(|entry| {
            if entry.kind != "tensor" {
                return Err(SignatureError::InvalidFormat(format!(
                    "不支持的规格类型 {}",
                    entry.kind
                )));
            }
            Ok(entry.spec)
        })
        .collect()
}
