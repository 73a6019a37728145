/*
 * @Author       : 老董
 * @Description  : 全连接层 y = activation(x·W + b)
 */

use ndarray::{Array1, Array2, ArrayD, ArrayView2, Axis};
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Activation, Layer, Parameter, to_matrix};
use crate::nn::ModelError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    name: String,
    activation: Activation,
    /// [input_dim, units]
    kernel: Array2<f32>,
    /// [units]
    bias: Array1<f32>,
    #[serde(skip)]
    grad_kernel: Array2<f32>,
    #[serde(skip)]
    grad_bias: Array1<f32>,
}

impl Dense {
    /// 用 Glorot 均匀分布初始化权重、零初始化偏置；相同`seed`得到相同的权重
    pub fn new_seeded(
        name: impl Into<String>,
        input_dim: usize,
        units: usize,
        activation: Activation,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let limit = (6.0 / (input_dim + units).max(1) as f32).sqrt();
        let uniform = Uniform::new_inclusive(-limit, limit);
        let kernel = Array2::from_shape_fn((input_dim, units), |_| uniform.sample(&mut rng));

        Self {
            name: name.into(),
            activation,
            kernel,
            bias: Array1::zeros(units),
            grad_kernel: Array2::zeros((0, 0)),
            grad_bias: Array1::zeros(0),
        }
    }

    /// 由已知权重构造
    pub fn from_weights(
        name: impl Into<String>,
        kernel: Array2<f32>,
        bias: Array1<f32>,
        activation: Activation,
    ) -> Result<Self, ModelError> {
        if kernel.ncols() != bias.len() {
            return Err(ModelError::ShapeMismatch {
                expected: vec![kernel.ncols()],
                got: vec![bias.len()],
                message: "偏置长度须等于输出单元数".to_string(),
            });
        }
        Ok(Self {
            name: name.into(),
            activation,
            kernel,
            bias,
            grad_kernel: Array2::zeros((0, 0)),
            grad_bias: Array1::zeros(0),
        })
    }

    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    pub fn units(&self) -> usize {
        self.kernel.ncols()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn kernel(&self) -> &Array2<f32> {
        &self.kernel
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// 最近一次反向传播得到的权重梯度（尚未反向传播时为空）
    pub fn grad_kernel(&self) -> &Array2<f32> {
        &self.grad_kernel
    }

    fn input_matrix<'a>(&self, input: &'a ArrayD<f32>) -> Result<ArrayView2<'a, f32>, ModelError> {
        let x = to_matrix(input.view(), &format!("{} 的输入", self.name))?;
        if x.ncols() != self.input_dim() {
            return Err(ModelError::ShapeMismatch {
                expected: vec![self.input_dim()],
                got: vec![x.ncols()],
                message: format!("{} 的输入特征数", self.name),
            });
        }
        Ok(x)
    }
}

impl Layer for Dense {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "Dense"
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, ModelError> {
        if input_shape != [self.input_dim()] {
            return Err(ModelError::ShapeMismatch {
                expected: vec![self.input_dim()],
                got: input_shape.to_vec(),
                message: format!("{} 的输入", self.name),
            });
        }
        Ok(vec![self.units()])
    }

    fn forward(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, ModelError> {
        let x = self.input_matrix(input)?;
        let z = x.dot(&self.kernel) + &self.bias;
        Ok(self.activation.forward(z).into_dyn())
    }

    fn backward(
        &mut self,
        input: &ArrayD<f32>,
        output: &ArrayD<f32>,
        grad_output: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>, ModelError> {
        let x = self.input_matrix(input)?;
        let out = to_matrix(output.view(), &format!("{} 的输出", self.name))?;
        let grad = to_matrix(grad_output.view(), &format!("{} 的输出梯度", self.name))?;
        if out.shape() != grad.shape() {
            return Err(ModelError::ShapeMismatch {
                expected: out.shape().to_vec(),
                got: grad.shape().to_vec(),
                message: format!("{} 的输出梯度", self.name),
            });
        }

        let dz = self.activation.backward(&out, &grad);
        self.grad_kernel = x.t().dot(&dz);
        self.grad_bias = dz.sum_axis(Axis(0));

        Ok(dz.dot(&self.kernel.t()).into_dyn())
    }

    fn parameters_mut(&mut self) -> Vec<Parameter<'_>> {
        let Self {
            name,
            kernel,
            bias,
            grad_kernel,
            grad_bias,
            ..
        } = self;
        vec![
            Parameter {
                name: format!("{name}/kernel"),
                value: kernel.view_mut().into_dyn(),
                grad: grad_kernel.view().into_dyn(),
            },
            Parameter {
                name: format!("{name}/bias"),
                value: bias.view_mut().into_dyn(),
                grad: grad_bias.view().into_dyn(),
            },
        ]
    }

    fn num_params(&self) -> usize {
        self.kernel.len() + self.bias.len()
    }
}
