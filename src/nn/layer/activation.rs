use ndarray::{Array2, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Dense 层的激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    /// 按行做 softmax
    Softmax,
}

impl Activation {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Relu => "relu",
            Self::Softmax => "softmax",
        }
    }

    pub fn forward(&self, mut z: Array2<f32>) -> Array2<f32> {
        match self {
            Self::Linear => z,
            Self::Relu => {
                z.mapv_inplace(|v| v.max(0.0));
                z
            }
            Self::Softmax => {
                for mut row in z.rows_mut() {
                    let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|v| v / sum);
                }
                z
            }
        }
    }

    /// 由激活后的输出`output`和对输出的梯度`grad`求对激活前输入的梯度
    pub fn backward(&self, output: &ArrayView2<f32>, grad: &ArrayView2<f32>) -> Array2<f32> {
        match self {
            Self::Linear => grad.to_owned(),
            Self::Relu => {
                let mut dz = grad.to_owned();
                Zip::from(&mut dz).and(output).for_each(|d, &o| {
                    if o <= 0.0 {
                        *d = 0.0;
                    }
                });
                dz
            }
            Self::Softmax => {
                // dz = s ⊙ (g - Σ(g ⊙ s))，按行
                let dot = (grad * output).sum_axis(Axis(1)).insert_axis(Axis(1));
                output * &(grad - &dot)
            }
        }
    }
}
