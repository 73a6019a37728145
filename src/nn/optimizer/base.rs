/*
 * @Author       : 老董
 * @Description  : 优化器基础trait和配置
 */

use serde::{Deserialize, Serialize};

use super::Adam;
use crate::nn::ModelError;
use crate::nn::layer::Parameter;

/// 优化器核心 trait
pub trait Optimizer: std::fmt::Debug {
    /// 参数更新（使用各层在反向传播中记录的梯度）
    ///
    /// 梯度形状与参数形状不一致的参数（如尚未反向传播过的层）会被跳过。
    fn step(&mut self, params: Vec<Parameter<'_>>);
}

/// 可序列化的优化器配置，随模型一起保存
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizerConfig {
    Adam {
        learning_rate: f32,
        beta_1: f32,
        beta_2: f32,
        epsilon: f32,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(0.001)
    }
}

impl OptimizerConfig {
    /// Adam，其余超参数取常用默认值（β1=0.9，β2=0.999，ε=1e-7）
    pub const fn adam(learning_rate: f32) -> Self {
        Self::Adam {
            learning_rate,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Adam { .. } => "Adam",
        }
    }

    pub const fn learning_rate(&self) -> f32 {
        match self {
            Self::Adam { learning_rate, .. } => *learning_rate,
        }
    }

    /// 超参数列表（名称, 值），供实验追踪记录
    pub fn hyper_params(&self) -> Vec<(&'static str, f32)> {
        match *self {
            Self::Adam {
                learning_rate,
                beta_1,
                beta_2,
                epsilon,
            } => vec![
                ("learning_rate", learning_rate),
                ("beta_1", beta_1),
                ("beta_2", beta_2),
                ("epsilon", epsilon),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let lr = self.learning_rate();
        if !lr.is_finite() || lr <= 0.0 {
            return Err(ModelError::InvalidArgument(format!(
                "学习率须为正数，实际为 {lr}"
            )));
        }
        let Self::Adam {
            beta_1,
            beta_2,
            epsilon,
            ..
        } = *self;
        for (name, beta) in [("beta_1", beta_1), ("beta_2", beta_2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(ModelError::InvalidArgument(format!(
                    "{name}须位于[0, 1)内，实际为 {beta}"
                )));
            }
        }
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ModelError::InvalidArgument(format!(
                "epsilon须为正数，实际为 {epsilon}"
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            Self::Adam {
                learning_rate,
                beta_1,
                beta_2,
                epsilon,
            } => Box::new(Adam::new(learning_rate, beta_1, beta_2, epsilon)),
        }
    }
}
