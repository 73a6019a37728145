//! 数据加载模块
//!
//! 提供 MNIST 数据集加载、预处理和批处理功能。
//!
//! # 主要组件
//!
//! - [`MnistDataset`]: MNIST 手写数字数据集（原始像素 + 类别索引）
//! - [`load_data`]: 一次性取得训练集与测试集
//! - [`transforms`]: 数据变换函数（归一化、one-hot 等）
//! - [`TensorDataset`]: 预处理后持有特征和标签的数据集
//! - [`DataLoader`]: `PyTorch` 风格的数据批量加载器
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use mnist_track::data::{load_data, DataLoader};
//!
//! let (train, test) = load_data(None, true)?;
//! let train = train.preprocess(10)?;
//! let loader = DataLoader::new(&train, 1).shuffle(true).seed(42);
//!
//! for (x_batch, y_batch) in loader.iter() {
//!     // ...
//! }
//! ```

mod dataloader;
pub mod datasets;
pub mod download;
pub mod error;
pub mod transforms;

#[cfg(test)]
mod tests;

// Re-exports
pub use dataloader::{DataLoader, DataLoaderIterator, TensorDataset};
pub use datasets::{MnistDataset, default_data_dir, load_data};
pub use error::DataError;
