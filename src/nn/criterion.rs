/*
 * @Author       : 老董
 * @Description  : 损失函数与评估指标
 */

use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// 概率裁剪下限，避免 log(0)
pub const PROB_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Loss {
    /// 多分类交叉熵：输入为 softmax 概率与 one-hot 标签
    #[default]
    CategoricalCrossentropy,
}

impl Loss {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CategoricalCrossentropy => "categorical_crossentropy",
        }
    }

    /// 一个 batch 内各样本损失之和（求均值由调用方按样本数完成）
    pub fn sum(&self, predictions: &ArrayView2<f32>, targets: &ArrayView2<f32>) -> f32 {
        match self {
            Self::CategoricalCrossentropy => {
                let mut total = 0.0f32;
                Zip::from(predictions).and(targets).for_each(|&p, &y| {
                    if y != 0.0 {
                        total -= y * clip(p).ln();
                    }
                });
                total
            }
        }
    }

    /// batch 平均损失对预测概率的梯度
    pub fn gradient(&self, predictions: &ArrayView2<f32>, targets: &ArrayView2<f32>) -> Array2<f32> {
        match self {
            Self::CategoricalCrossentropy => {
                let n = predictions.nrows().max(1) as f32;
                let mut grad = Array2::zeros(predictions.raw_dim());
                Zip::from(&mut grad)
                    .and(predictions)
                    .and(targets)
                    .for_each(|g, &p, &y| *g = -y / clip(p) / n);
                grad
            }
        }
    }
}

fn clip(p: f32) -> f32 {
    p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Metric {
    /// 预测类别（概率最大者）与 one-hot 标签类别一致的比例
    #[default]
    Accuracy,
}

impl Metric {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
        }
    }

    /// 预测正确的样本数
    pub fn count_correct(&self, predictions: &ArrayView2<f32>, targets: &ArrayView2<f32>) -> usize {
        match self {
            Self::Accuracy => predictions
                .rows()
                .into_iter()
                .zip(targets.rows())
                .filter(|(p, y)| argmax(p) == argmax(y))
                .count(),
        }
    }
}

/// 行内最大值的下标（并列时取第一个）
pub(crate) fn argmax(row: &ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}
