use super::Tensor;
use crate::errors::{ComparisonOperator, TensorError};
use ndarray::{Axis, Slice};
use std::ops::{Index, Range};

// 克隆式的行选取（第一维）
impl Tensor {
    /// 选取第一维上`range`范围内的连续样本
    pub fn rows(&self, range: Range<usize>) -> Result<Tensor, TensorError> {
        self.ensure_has_rows()?;
        let len = self.len();
        if range.end > len || range.start > range.end {
            return Err(TensorError::RowOutOfBounds {
                index: range.end,
                len,
            });
        }
        let sliced = self
            .data
            .slice_axis(Axis(0), Slice::from(range.start..range.end));
        Ok(Tensor::from_array(sliced.to_owned()))
    }

    /// 按给定索引（可乱序、可重复）选取第一维上的样本
    pub fn select_rows(&self, indices: &[usize]) -> Result<Tensor, TensorError> {
        self.ensure_has_rows()?;
        let len = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(TensorError::RowOutOfBounds { index, len });
        }
        Ok(Tensor::from_array(self.data.select(Axis(0), indices)))
    }

    fn ensure_has_rows(&self) -> Result<(), TensorError> {
        if self.dimension() == 0 {
            return Err(TensorError::ValueMustSatisfyComparison {
                value_name: "张量维数".to_string(),
                operator: ComparisonOperator::GreaterOrEqual,
                threshold: 1,
            });
        }
        Ok(())
    }
}

// 引用式索引：tensor[[i]]、tensor[[i, j]]、tensor[[i, j, k]]
impl<const N: usize> Index<[usize; N]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; N]) -> &Self::Output {
        &self.data[&index[..]]
    }
}
