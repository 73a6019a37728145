//! MNIST 数据集单元测试
//!
//! 不依赖网络：IDX 文件在临时目录中现场生成。

use std::fs::File;
use std::io::Write;
use std::path::Path;

use approx::assert_abs_diff_eq;
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::data::datasets::default_data_dir;
use crate::data::{DataError, MnistDataset, load_data};

fn idx_images(pixels: &[u8], count: usize, rows: u32, cols: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2051u32.to_be_bytes());
    bytes.extend_from_slice(&(count as u32).to_be_bytes());
    bytes.extend_from_slice(&rows.to_be_bytes());
    bytes.extend_from_slice(&cols.to_be_bytes());
    bytes.extend_from_slice(pixels);
    bytes
}

fn idx_labels(labels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2049u32.to_be_bytes());
    bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    bytes.extend_from_slice(labels);
    bytes
}

fn write_plain(path: &Path, bytes: &[u8]) {
    std::fs::write(path, bytes).unwrap();
}

fn write_gz(path: &Path, bytes: &[u8]) {
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap();
}

fn sample_pixels(count: usize) -> Vec<u8> {
    (0..count * 784).map(|i| (i % 256) as u8).collect()
}

#[test]
fn test_default_data_dir() {
    let dir = default_data_dir();
    assert!(dir.to_string_lossy().contains("mnist_track"));
    assert!(dir.to_string_lossy().contains("datasets"));
}

#[test]
fn test_from_raw() {
    let dataset = MnistDataset::from_raw(&sample_pixels(3), &[7, 0, 9]).unwrap();

    assert_eq!(dataset.len(), 3);
    assert!(!dataset.is_empty());
    assert_eq!(dataset.images().shape(), &[3, 28, 28]);
    assert_eq!(dataset.labels().shape(), &[3]);
    assert_eq!(dataset.input_shape(), vec![28, 28]);

    let (image, label) = dataset.get(2).unwrap();
    assert_eq!(image.shape(), &[28, 28]);
    assert_eq!(label, 9);
}

#[test]
fn test_from_raw_shape_mismatch() {
    let result = MnistDataset::from_raw(&[0u8; 100], &[1]);
    assert!(matches!(result, Err(DataError::ShapeMismatch { .. })));
}

#[test]
fn test_from_raw_label_out_of_range() {
    let result = MnistDataset::from_raw(&sample_pixels(1), &[10]);
    assert!(matches!(result, Err(DataError::FormatError(_))));
}

#[test]
fn test_get_index_out_of_bounds() {
    let dataset = MnistDataset::from_raw(&sample_pixels(2), &[1, 2]).unwrap();
    assert!(matches!(
        dataset.get(2),
        Err(DataError::IndexOutOfBounds { index: 2, len: 2 })
    ));
}

#[test]
fn test_take_subset() {
    let dataset = MnistDataset::from_raw(&sample_pixels(5), &[0, 1, 2, 3, 4]).unwrap();

    let subset = dataset.clone().take(3).unwrap();
    assert_eq!(subset.len(), 3);
    assert_eq!(subset.labels().data_as_slice(), &[0.0, 1.0, 2.0]);

    // n 超过样本数时保持不变
    let all = dataset.take(100).unwrap();
    assert_eq!(all.len(), 5);
}

#[test]
fn test_preprocess_properties() {
    let dataset = MnistDataset::synthetic(50, 7).unwrap();
    let processed = dataset.preprocess(10).unwrap();

    assert_eq!(processed.len(), 50);
    assert_eq!(processed.features().shape(), &[50, 28, 28]);
    assert_eq!(processed.labels().shape(), &[50, 10]);

    // 像素值应该在 [0, 1] 范围内（已归一化）
    assert!(processed.features().min_value() >= 0.0);
    assert!(processed.features().max_value() <= 1.0);

    // one-hot 每行恰好和为 1，且 1 的位置与原标签一致
    for i in 0..50 {
        let row_sum: f32 = (0..10).map(|j| processed.labels()[[i, j]]).sum();
        assert_abs_diff_eq!(row_sum, 1.0, epsilon = 1e-6);
        let label = dataset.labels()[[i]] as usize;
        assert_eq!(processed.labels()[[i, label]], 1.0);
    }
}

#[test]
fn test_synthetic_is_deterministic() {
    let a = MnistDataset::synthetic(20, 1).unwrap();
    let b = MnistDataset::synthetic(20, 1).unwrap();
    let c = MnistDataset::synthetic(20, 2).unwrap();

    assert_eq!(a.images(), b.images());
    assert_eq!(a.labels(), b.labels());
    assert_ne!(a.images(), c.images());
    assert!(a.images().max_value() <= 255.0);
}

#[test]
fn test_load_plain_idx_files() {
    let dir = tempfile::tempdir().unwrap();
    let pixels = sample_pixels(4);
    write_plain(
        &dir.path().join("train-images-idx3-ubyte"),
        &idx_images(&pixels, 4, 28, 28),
    );
    write_plain(
        &dir.path().join("train-labels-idx1-ubyte"),
        &idx_labels(&[3, 1, 4, 1]),
    );

    let dataset = MnistDataset::load(Some(dir.path()), true, false).unwrap();
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.labels().data_as_slice(), &[3.0, 1.0, 4.0, 1.0]);
    assert_eq!(dataset.images()[[0, 0, 5]], 5.0);
}

#[test]
fn test_load_data_gz_files() {
    let dir = tempfile::tempdir().unwrap();
    write_gz(
        &dir.path().join("train-images-idx3-ubyte.gz"),
        &idx_images(&sample_pixels(3), 3, 28, 28),
    );
    write_gz(
        &dir.path().join("train-labels-idx1-ubyte.gz"),
        &idx_labels(&[0, 1, 2]),
    );
    write_gz(
        &dir.path().join("t10k-images-idx3-ubyte.gz"),
        &idx_images(&sample_pixels(2), 2, 28, 28),
    );
    write_gz(
        &dir.path().join("t10k-labels-idx1-ubyte.gz"),
        &idx_labels(&[8, 9]),
    );

    let (train, test) = load_data(Some(dir.path()), false).unwrap();
    assert_eq!(train.len(), 3);
    assert_eq!(test.len(), 2);
    assert_eq!(test.get(1).unwrap().1, 9);
}

#[test]
fn test_load_invalid_magic() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = idx_images(&sample_pixels(1), 1, 28, 28);
    bytes[3] = 0x01;
    write_plain(&dir.path().join("t10k-images-idx3-ubyte"), &bytes);
    write_plain(&dir.path().join("t10k-labels-idx1-ubyte"), &idx_labels(&[1]));

    let result = MnistDataset::load(Some(dir.path()), false, false);
    assert!(matches!(result, Err(DataError::FormatError(_))));
}

#[test]
fn test_load_invalid_image_size() {
    let dir = tempfile::tempdir().unwrap();
    write_plain(
        &dir.path().join("t10k-images-idx3-ubyte"),
        &idx_images(&[0u8; 32 * 32], 1, 32, 32),
    );
    write_plain(&dir.path().join("t10k-labels-idx1-ubyte"), &idx_labels(&[1]));

    let result = MnistDataset::load(Some(dir.path()), false, false);
    assert!(matches!(result, Err(DataError::FormatError(_))));
}

#[test]
fn test_load_truncated_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = idx_images(&sample_pixels(2), 2, 28, 28);
    bytes.truncate(bytes.len() - 10);
    write_plain(&dir.path().join("t10k-images-idx3-ubyte"), &bytes);
    write_plain(&dir.path().join("t10k-labels-idx1-ubyte"), &idx_labels(&[1, 2]));

    let result = MnistDataset::load(Some(dir.path()), false, false);
    assert!(matches!(result, Err(DataError::FormatError(_))));
}

#[test]
fn test_load_huge_image_count_in_header() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = idx_images(&sample_pixels(1), 1, 28, 28);
    bytes[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
    write_plain(&dir.path().join("train-images-idx3-ubyte"), &bytes);
    write_plain(&dir.path().join("train-labels-idx1-ubyte"), &idx_labels(&[1]));

    let result = MnistDataset::load(Some(dir.path()), true, false);
    assert!(matches!(result, Err(DataError::FormatError(_))));
}

#[test]
fn test_load_huge_label_count_in_header() {
    let dir = tempfile::tempdir().unwrap();
    write_plain(
        &dir.path().join("t10k-images-idx3-ubyte"),
        &idx_images(&sample_pixels(1), 1, 28, 28),
    );
    let mut labels = idx_labels(&[1]);
    labels[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
    write_plain(&dir.path().join("t10k-labels-idx1-ubyte"), &labels);

    let result = MnistDataset::load(Some(dir.path()), false, false);
    assert!(matches!(result, Err(DataError::FormatError(_))));
}

#[test]
fn test_load_count_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_plain(
        &dir.path().join("t10k-images-idx3-ubyte"),
        &idx_images(&sample_pixels(2), 2, 28, 28),
    );
    write_plain(&dir.path().join("t10k-labels-idx1-ubyte"), &idx_labels(&[1]));

    let result = MnistDataset::load(Some(dir.path()), false, false);
    assert!(matches!(result, Err(DataError::ShapeMismatch { .. })));
}

#[test]
fn test_load_missing_files_without_download() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nonexistent_path");

    let result = MnistDataset::load(Some(&missing), true, false);
    assert!(matches!(result, Err(DataError::FileNotFound(_))));
}
