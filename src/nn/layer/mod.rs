/*
 * @Author       : 老董
 * @Description  : 网络层：Flatten、Dense（含激活函数）
 *
 * 所有层都以“第一维为 batch”的 ndarray 动态数组作为输入输出，
 * 通过 enum_dispatch 统一分派，便于 Sequential 按顺序持有与序列化。
 */

mod activation;
mod dense;
mod flatten;

pub use activation::Activation;
pub use dense::Dense;
pub use flatten::Flatten;

use enum_dispatch::enum_dispatch;
use ndarray::{ArrayD, ArrayView2, ArrayViewD, ArrayViewMutD, Ix2};
use serde::{Deserialize, Serialize};

use crate::nn::ModelError;

/// 可训练参数（值的可变视图 + 最近一次反向传播得到的梯度）
pub struct Parameter<'a> {
    /// 形如 `dense/kernel` 的唯一名称，优化器据此保存各参数的状态
    pub name: String,
    pub value: ArrayViewMutD<'a, f32>,
    pub grad: ArrayViewD<'a, f32>,
}

/// 网络层的公共行为
#[enum_dispatch]
pub trait Layer {
    /// 层名（同一模型内唯一）
    fn name(&self) -> &str;

    /// 层类型名，如 `Dense`
    fn type_name(&self) -> &'static str;

    /// 由单个样本的输入形状推出输出形状（均不含 batch 维度）
    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, ModelError>;

    /// 前向传播
    fn forward(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, ModelError>;

    /// 反向传播：根据本层的输入、输出和输出梯度，记录参数梯度并返回输入梯度
    fn backward(
        &mut self,
        input: &ArrayD<f32>,
        output: &ArrayD<f32>,
        grad_output: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>, ModelError>;

    /// 可训练参数
    fn parameters_mut(&mut self) -> Vec<Parameter<'_>>;

    /// 可训练参数的元素总数
    fn num_params(&self) -> usize;
}

#[enum_dispatch(Layer)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LayerKind {
    Flatten,
    Dense,
}

/// 将 [N, C] 形状的动态视图转为二维视图
pub(crate) fn to_matrix<'a>(
    view: ArrayViewD<'a, f32>,
    what: &str,
) -> Result<ArrayView2<'a, f32>, ModelError> {
    let shape = view.shape().to_vec();
    view.into_dimensionality::<Ix2>()
        .map_err(|_| ModelError::ShapeMismatch {
            expected: vec![],
            got: shape,
            message: format!("{what}须为二维矩阵"),
        })
}
