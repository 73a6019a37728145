//! 模型保存/加载单元测试

use super::synthetic_dataset;
use crate::nn::{CompileOptions, FitOptions, Model, ModelError, Sequential};

#[test]
fn test_save_load_round_trip_keeps_predictions() {
    let train = synthetic_dataset(20, 0);
    let mut model = Sequential::mnist_mlp(&[28, 28], 16, 10, 42).unwrap();
    model.compile(CompileOptions::default()).unwrap();
    model
        .fit(
            &train,
            &FitOptions {
                epochs: 1,
                batch_size: 1,
                ..Default::default()
            },
            &mut [],
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.mntm");
    model.save(&path).unwrap();

    let loaded = Sequential::load(&path).unwrap();
    assert!(loaded.is_compiled());
    assert_eq!(loaded.compile_options(), model.compile_options());
    assert_eq!(loaded.num_params(), model.num_params());

    let before = model.predict(train.features()).unwrap();
    let after = loaded.predict(train.features()).unwrap();
    assert!(before.max_abs_diff(&after).unwrap() < 1e-6);
}

#[test]
fn test_file_bytes_equal_to_bytes() {
    let model = Sequential::mnist_mlp(&[28, 28], 4, 10, 1).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mntm");
    model.save(&path).unwrap();

    let bytes = model.to_bytes().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    assert_eq!(&bytes[..4], b"MNTM");
    assert_eq!(&bytes[4..8], &1u32.to_le_bytes());

    let restored = Sequential::from_bytes(&bytes).unwrap();
    assert!(!restored.is_compiled());
    assert_eq!(restored.summary(), model.summary());
}

#[test]
fn test_load_rejects_bad_header() {
    let model = Sequential::mnist_mlp(&[28, 28], 4, 10, 1).unwrap();
    let mut bytes = model.to_bytes().unwrap();

    assert!(matches!(
        Sequential::from_bytes(b"MN"),
        Err(ModelError::InvalidFormat(_))
    ));

    bytes[4] = 9;
    assert!(matches!(
        Sequential::from_bytes(&bytes),
        Err(ModelError::InvalidFormat(_))
    ));

    bytes[0] = b'X';
    assert!(matches!(
        Sequential::from_bytes(&bytes),
        Err(ModelError::InvalidFormat(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Sequential::load(dir.path().join("missing.mntm")),
        Err(ModelError::Io(_))
    ));
}
