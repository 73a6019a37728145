use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use super::{Layer, Parameter};
use crate::nn::ModelError;

/// 展平层：[N, d1, d2, ...] -> [N, d1*d2*...]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flatten {
    name: String,
    input_shape: Vec<usize>,
}

impl Flatten {
    pub fn new(name: impl Into<String>, input_shape: &[usize]) -> Self {
        Self {
            name: name.into(),
            input_shape: input_shape.to_vec(),
        }
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn units(&self) -> usize {
        self.input_shape.iter().product()
    }

    fn check_sample_shape(&self, sample_shape: &[usize]) -> Result<(), ModelError> {
        if sample_shape != self.input_shape.as_slice() {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_shape.clone(),
                got: sample_shape.to_vec(),
                message: format!("{} 的输入", self.name),
            });
        }
        Ok(())
    }
}

fn reshape(array: &ArrayD<f32>, shape: &[usize]) -> Result<ArrayD<f32>, ModelError> {
    array
        .as_standard_layout()
        .into_owned()
        .into_shape(IxDyn(shape))
        .map_err(|e| ModelError::InvalidArgument(format!("变形失败: {e}")))
}

impl Layer for Flatten {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "Flatten"
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, ModelError> {
        self.check_sample_shape(input_shape)?;
        Ok(vec![self.units()])
    }

    fn forward(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, ModelError> {
        let shape = input.shape();
        if shape.is_empty() {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_shape.clone(),
                got: vec![],
                message: format!("{} 的输入缺少 batch 维度", self.name),
            });
        }
        self.check_sample_shape(&shape[1..])?;
        reshape(input, &[shape[0], self.units()])
    }

    fn backward(
        &mut self,
        input: &ArrayD<f32>,
        _output: &ArrayD<f32>,
        grad_output: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>, ModelError> {
        reshape(grad_output, input.shape())
    }

    fn parameters_mut(&mut self) -> Vec<Parameter<'_>> {
        Vec::new()
    }

    fn num_params(&self) -> usize {
        0
    }
}
