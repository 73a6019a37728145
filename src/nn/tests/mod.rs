mod criterion;
mod layer;
mod serialization;

use crate::data::{MnistDataset, TensorDataset};

/// 确定性的小型合成数据集（像素已归一化，标签已 one-hot）
fn synthetic_dataset(len: usize, seed: u64) -> TensorDataset {
    MnistDataset::synthetic(len, seed)
        .unwrap()
        .preprocess(10)
        .unwrap()
}
