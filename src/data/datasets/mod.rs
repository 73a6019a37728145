//! 内置数据集
//!
//! - MNIST：手写数字分类
//! - 合成数字：离线可复现的小型替身数据（用于测试与演示）

mod mnist;
mod synthetic;

use std::path::Path;

use super::error::DataError;

pub use mnist::{IMAGE_SIDE, MnistDataset, NUM_CLASSES, default_data_dir};

/// 取得固定划分的训练集与测试集
///
/// # 参数
/// - `root`: 数据目录，None 则使用默认缓存目录
/// - `download`: 缺失文件时是否自动下载
///
/// 数据源不可达或文件损坏时直接返回错误，不做重试。
pub fn load_data(
    root: Option<&Path>,
    download: bool,
) -> Result<(MnistDataset, MnistDataset), DataError> {
    let train = MnistDataset::load(root, true, download)?;
    let test = MnistDataset::load(root, false, download)?;
    Ok((train, test))
}
