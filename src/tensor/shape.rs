use super::Tensor;
use crate::errors::TensorError;
use ndarray::IxDyn;

impl Tensor {
    /// 变形，元素总数不一致时panic
    pub fn reshape(&self, shape: &[usize]) -> Self {
        match self.try_reshape(shape) {
            Ok(tensor) => tensor,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_reshape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        let incompatible = || TensorError::IncompatibleShape {
            size: self.size(),
            shape: shape.to_vec(),
        };
        if self.size() != shape.iter().product::<usize>() {
            return Err(incompatible());
        }
        let data = self
            .data
            .clone()
            .into_shape(IxDyn(shape))
            .map_err(|_| incompatible())?;
        Ok(Self { data })
    }

    /// 展平为一维向量
    pub fn flatten(&self) -> Self {
        self.reshape(&[self.size()])
    }
}
