//! 数据变换函数
//!
//! 提供常用的数据预处理操作，如归一化、one-hot 编码等。
//! 所有函数均为纯函数，不修改输入。

use crate::data::error::DataError;
use crate::tensor::Tensor;

/// 将 0-255 像素值归一化到 0-1
///
/// # 参数
/// - `tensor`: 输入 Tensor，值范围 [0, 255]
///
/// # 返回
/// 归一化后的 Tensor，值范围 [0, 1]
pub fn normalize_pixels(tensor: &Tensor) -> Tensor {
    tensor / 255.0
}

/// 将类别索引转换为 one-hot 编码
///
/// # 参数
/// - `labels`: 类别索引 Tensor，形状 [N] 或 [N, 1]，值为 0..num_classes
/// - `num_classes`: 类别总数
///
/// # 返回
/// one-hot 编码 Tensor，形状 [N, num_classes]；
/// 若存在负数、非整数或不小于 `num_classes` 的标签则返回 `DataError::InvalidLabel`
///
/// # 示例
/// ```ignore
/// let labels = Tensor::new(&[0.0, 2.0, 1.0], &[3]);
/// let one_hot = one_hot(&labels, 3)?;
/// // 结果: [[1,0,0], [0,0,1], [0,1,0]]
/// ```
pub fn one_hot(labels: &Tensor, num_classes: usize) -> Result<Tensor, DataError> {
    let flat = labels.flatten();
    let n = flat.size();

    let mut data = vec![0.0; n * num_classes];
    for (i, &value) in flat.data_as_slice().iter().enumerate() {
        let class_idx = value as usize;
        if value < 0.0 || value.fract() != 0.0 || class_idx >= num_classes {
            return Err(DataError::InvalidLabel {
                label: class_idx,
                num_classes,
            });
        }
        data[i * num_classes + class_idx] = 1.0;
    }

    Ok(Tensor::new(&data, &[n, num_classes]))
}
