//! MNIST 手写数字数据集
//!
//! 支持：
//! - IDX 二进制格式解析（支持 .gz 压缩）
//! - 可选自动下载（附 MD5 校验）
//! - 截取前 n 个样本的确定性子集
//!
//! 数据集本身只保存原始像素 [0, 255] 与类别索引 0-9，
//! 归一化与 one-hot 编码由 [`MnistDataset::preprocess`] 完成。

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::data::dataloader::TensorDataset;
use crate::data::download::download_file;
use crate::data::error::DataError;
use crate::data::transforms::{normalize_pixels, one_hot};
use crate::tensor::Tensor;

/// 图像边长（28x28）
pub const IMAGE_SIDE: usize = 28;
/// 类别总数（数字 0-9）
pub const NUM_CLASSES: usize = 10;

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

/// MNIST 下载地址（使用 AWS S3 镜像，原官网 yann.lecun.com 不稳定）
const MNIST_BASE_URL: &str = "https://ossci-datasets.s3.amazonaws.com/mnist/";

/// MNIST 文件信息（文件名, 压缩包 MD5）
const MNIST_FILES: [(&str, &str); 4] = [
    (
        "train-images-idx3-ubyte.gz",
        "f68b3c2dcbeaaa9fbdd348bbdeb94873",
    ),
    (
        "train-labels-idx1-ubyte.gz",
        "d53e105ee54ea40749a09fcbcd1e9432",
    ),
    (
        "t10k-images-idx3-ubyte.gz",
        "9fb629c4189551a2d022fa330f9573f3",
    ),
    (
        "t10k-labels-idx1-ubyte.gz",
        "ec29112dd5afa0611ce80d1b7f02629c",
    ),
];

/// MNIST 手写数字数据集
///
/// 官方划分包含 60,000 个训练样本和 10,000 个测试样本。
/// 每个样本是 28x28 的灰度图像，标签为 0-9。
#[derive(Debug, Clone)]
pub struct MnistDataset {
    /// 原始像素 [N, 28, 28]，值域 [0, 255]
    images: Tensor,
    /// 类别索引 [N]
    labels: Tensor,
    /// 样本数量
    len: usize,
}

impl MnistDataset {
    /// 完整加载 API
    ///
    /// # 参数
    /// - `root`: 数据目录，None 则使用默认 (~/.cache/mnist_track/datasets/mnist)
    /// - `train`: true=训练集(60000), false=测试集(10000)
    /// - `download`: true=自动下载缺失文件
    pub fn load(root: Option<&Path>, train: bool, download: bool) -> Result<Self, DataError> {
        let data_dir = root
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_data_dir().join("mnist"));

        let (images_file, labels_file) = if train {
            ("train-images-idx3-ubyte", "train-labels-idx1-ubyte")
        } else {
            ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte")
        };

        let images_path = ensure_file(&data_dir, images_file, download)?;
        let labels_path = ensure_file(&data_dir, labels_file, download)?;

        let (num_images, pixels) = parse_idx_images(&images_path)?;
        let labels = parse_idx_labels(&labels_path)?;
        if num_images != labels.len() {
            return Err(DataError::ShapeMismatch {
                expected: vec![num_images],
                got: vec![labels.len()],
            });
        }

        let dataset = Self::from_raw(&pixels, &labels)?;
        log::info!(
            "已加载 MNIST {}集: {} 个样本 ({:?})",
            if train { "训练" } else { "测试" },
            dataset.len(),
            data_dir
        );
        Ok(dataset)
    }

    /// 由内存中的原始字节构造数据集
    ///
    /// # 参数
    /// - `pixels`: 按样本连续排列的像素，长度须为 `labels.len() * 784`
    /// - `labels`: 类别索引，取值 0-9
    pub fn from_raw(pixels: &[u8], labels: &[u8]) -> Result<Self, DataError> {
        let len = labels.len();
        let sample_size = IMAGE_SIDE * IMAGE_SIDE;
        if pixels.len() != len * sample_size {
            return Err(DataError::ShapeMismatch {
                expected: vec![len, IMAGE_SIDE, IMAGE_SIDE],
                got: vec![pixels.len()],
            });
        }
        if let Some(&label) = labels.iter().find(|&&l| l as usize >= NUM_CLASSES) {
            return Err(DataError::FormatError(format!(
                "标签 {label} 超出范围 0-{}",
                NUM_CLASSES - 1
            )));
        }

        let pixel_data: Vec<f32> = pixels.iter().map(|&p| p as f32).collect();
        let label_data: Vec<f32> = labels.iter().map(|&l| l as f32).collect();

        Ok(Self {
            images: Tensor::try_new(&pixel_data, &[len, IMAGE_SIDE, IMAGE_SIDE])?,
            labels: Tensor::try_new(&label_data, &[len])?,
            len,
        })
    }

    /// 只保留前 `n` 个样本（n 大于样本数时保持不变）
    pub fn take(self, n: usize) -> Result<Self, DataError> {
        if n >= self.len {
            return Ok(self);
        }
        Ok(Self {
            images: self.images.rows(0..n)?,
            labels: self.labels.rows(0..n)?,
            len: n,
        })
    }

    /// 返回数据集中的样本数量
    pub fn len(&self) -> usize {
        self.len
    }

    /// 数据集是否为空
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 获取第 index 个样本
    ///
    /// # 返回
    /// (image, label) 元组
    /// - image: [28, 28] 原始像素
    /// - label: 类别索引
    pub fn get(&self, index: usize) -> Result<(Tensor, usize), DataError> {
        if index >= self.len {
            return Err(DataError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }

        let image = self
            .images
            .rows(index..index + 1)?
            .reshape(&[IMAGE_SIDE, IMAGE_SIDE]);
        let label = self.labels[[index]] as usize;

        Ok((image, label))
    }

    /// 输入的形状（不含 batch 维度）
    pub fn input_shape(&self) -> Vec<usize> {
        vec![IMAGE_SIDE, IMAGE_SIDE]
    }

    /// 获取所有原始图像 [N, 28, 28]
    pub fn images(&self) -> &Tensor {
        &self.images
    }

    /// 获取所有类别索引 [N]
    pub fn labels(&self) -> &Tensor {
        &self.labels
    }

    /// 预处理：像素归一化到 [0, 1]，标签转为 one-hot [N, num_classes]
    pub fn preprocess(&self, num_classes: usize) -> Result<TensorDataset, DataError> {
        let features = normalize_pixels(&self.images);
        let labels = one_hot(&self.labels, num_classes)?;
        TensorDataset::new(features, labels)
    }
}

/// 获取默认数据目录
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mnist_track")
        .join("datasets")
}

/// 确保文件存在，必要时下载
fn ensure_file(data_dir: &Path, base_name: &str, download: bool) -> Result<PathBuf, DataError> {
    // 优先检查解压后的文件
    let uncompressed_path = data_dir.join(base_name);
    if uncompressed_path.exists() {
        return Ok(uncompressed_path);
    }

    let gz_name = format!("{base_name}.gz");
    let gz_path = data_dir.join(&gz_name);
    if gz_path.exists() {
        return Ok(gz_path);
    }

    if download {
        std::fs::create_dir_all(data_dir)?;
        let expected_md5 = MNIST_FILES
            .iter()
            .find(|(name, _)| *name == gz_name)
            .map(|(_, md5)| *md5);
        let url = format!("{MNIST_BASE_URL}{gz_name}");
        download_file(&url, &gz_path, expected_md5)?;
        Ok(gz_path)
    } else {
        Err(DataError::FileNotFound(uncompressed_path))
    }
}

/// 打开 IDX 文件，`.gz` 后缀时透明解压
fn open_idx(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

fn read_u32_be(header: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        header[offset],
        header[offset + 1],
        header[offset + 2],
        header[offset + 3],
    ])
}

/// 读取头部之后的数据区，最多读`expected`字节，不足时视为文件损坏
///
/// 头部里的数量不可信，不能据此预先分配缓冲区
fn read_body(reader: impl Read, expected: usize, what: &str) -> Result<Vec<u8>, DataError> {
    let mut buf = Vec::new();
    reader
        .take(expected as u64)
        .read_to_end(&mut buf)
        .map_err(|e| DataError::FormatError(format!("读取{what}数据失败: {e}")))?;
    if buf.len() != expected {
        return Err(DataError::FormatError(format!(
            "{what}数据不完整: 头部声明 {expected} 字节，实际只有 {} 字节",
            buf.len()
        )));
    }
    Ok(buf)
}

/// 解析 IDX 图像文件
///
/// IDX 格式：
/// - [0-3] magic number (0x00000803 = 2051)
/// - [4-7] number of images
/// - [8-11] number of rows
/// - [12-15] number of columns
/// - [16+] pixel data (unsigned byte)
fn parse_idx_images(path: &Path) -> Result<(usize, Vec<u8>), DataError> {
    let mut reader = open_idx(path)?;
    let mut header = [0u8; 16];
    reader
        .read_exact(&mut header)
        .map_err(|e| DataError::FormatError(format!("读取头部失败: {e}")))?;

    let magic = read_u32_be(&header, 0);
    if magic != IMAGE_MAGIC {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {magic} (期望 {IMAGE_MAGIC})"
        )));
    }

    let num_images = read_u32_be(&header, 4) as usize;
    let num_rows = read_u32_be(&header, 8) as usize;
    let num_cols = read_u32_be(&header, 12) as usize;

    if num_rows != IMAGE_SIDE || num_cols != IMAGE_SIDE {
        return Err(DataError::FormatError(format!(
            "无效的图像尺寸: {num_rows}x{num_cols} (期望 28x28)"
        )));
    }

    let expected = num_images
        .checked_mul(num_rows * num_cols)
        .ok_or_else(|| DataError::FormatError(format!("图像数量溢出: {num_images}")))?;
    let pixels = read_body(reader, expected, "像素")?;

    Ok((num_images, pixels))
}

/// 解析 IDX 标签文件
///
/// IDX 格式：
/// - [0-3] magic number (0x00000801 = 2049)
/// - [4-7] number of labels
/// - [8+] label data (unsigned byte, 0-9)
fn parse_idx_labels(path: &Path) -> Result<Vec<u8>, DataError> {
    let mut reader = open_idx(path)?;
    let mut header = [0u8; 8];
    reader
        .read_exact(&mut header)
        .map_err(|e| DataError::FormatError(format!("读取头部失败: {e}")))?;

    let magic = read_u32_be(&header, 0);
    if magic != LABEL_MAGIC {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {magic} (期望 {LABEL_MAGIC})"
        )));
    }

    let num_labels = read_u32_be(&header, 4) as usize;
    read_body(reader, num_labels, "标签")
}
