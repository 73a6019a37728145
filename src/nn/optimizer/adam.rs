/*
 * @Author       : 老董
 * @Description  : Adam优化器实现
 */

use std::collections::HashMap;

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};

use super::base::Optimizer;
use crate::nn::layer::Parameter;

/// Adam优化器
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// 一阶矩估计
    m: HashMap<String, ArrayD<f32>>,
    /// 二阶矩估计
    v: HashMap<String, ArrayD<f32>>,
    /// 时间步
    t: usize,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }

    fn update(&mut self, name: &str, mut value: ArrayViewMutD<'_, f32>, grad: ArrayViewD<'_, f32>) {
        let shape = grad.raw_dim();
        let m = self
            .m
            .entry(name.to_string())
            .or_insert_with(|| ArrayD::zeros(shape.clone()));
        let v = self
            .v
            .entry(name.to_string())
            .or_insert_with(|| ArrayD::zeros(shape));

        let (beta1, beta2) = (self.beta1, self.beta2);
        let bias_correction1 = 1.0 - beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - beta2.powi(self.t as i32);
        let (lr, eps) = (self.learning_rate, self.epsilon);

        // m = β1*m + (1-β1)*g；v = β2*v + (1-β2)*g²；θ = θ - α*m̂/(√v̂ + ε)
        Zip::from(&mut value)
            .and(m)
            .and(v)
            .and(&grad)
            .for_each(|theta, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias_correction1;
                let v_hat = *v / bias_correction2;
                *theta -= lr * m_hat / (v_hat.sqrt() + eps);
            });
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: Vec<Parameter<'_>>) {
        self.t += 1;
        for Parameter { name, value, grad } in params {
            if grad.shape() != value.shape() {
                continue;
            }
            self.update(&name, value, grad);
        }
    }
}
