//! DataLoader 单元测试

use crate::data::{DataLoader, TensorDataset};
use crate::tensor::Tensor;

fn make_dataset(n: usize) -> TensorDataset {
    let features: Vec<f32> = (0..n * 2).map(|x| x as f32).collect();
    let labels: Vec<f32> = (0..n).map(|x| x as f32).collect();
    TensorDataset::new(Tensor::new(&features, &[n, 2]), Tensor::new(&labels, &[n, 1])).unwrap()
}

#[test]
fn test_tensor_dataset_len_mismatch() {
    let result = TensorDataset::new(Tensor::zeros(&[3, 2]), Tensor::zeros(&[2, 1]));
    assert!(result.is_err());
}

#[test]
fn test_batches_in_order() {
    let dataset = make_dataset(5);
    let loader = DataLoader::new(&dataset, 2);

    assert_eq!(loader.num_batches(), 3);
    let batches: Vec<_> = loader.iter().collect();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].0.shape(), &[2, 2]);
    assert_eq!(batches[2].0.shape(), &[1, 2]);
    assert_eq!(batches[2].1[[0, 0]], 4.0);
}

#[test]
fn test_drop_last() {
    let dataset = make_dataset(5);
    let loader = DataLoader::new(&dataset, 2).drop_last(true);

    assert_eq!(loader.num_batches(), 2);
    assert_eq!(loader.iter().count(), 2);
}

#[test]
fn test_batch_size_one_visits_every_sample_once() {
    let dataset = make_dataset(7);
    let loader = DataLoader::new(&dataset, 1).shuffle(true).seed(3);

    let mut seen: Vec<usize> = loader.iter().map(|(_, y)| y[[0, 0]] as usize).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..7).collect::<Vec<_>>());
}

#[test]
fn test_seeded_shuffle_is_reproducible() {
    let dataset = make_dataset(20);
    let order = |seed| -> Vec<f32> {
        DataLoader::new(&dataset, 4)
            .shuffle(true)
            .seed(seed)
            .iter()
            .flat_map(|(_, y)| y.data_as_slice().to_vec())
            .collect()
    };

    assert_eq!(order(42), order(42));
    assert_ne!(order(42), order(43));
}

#[test]
#[should_panic(expected = "batch_size须>0")]
fn test_zero_batch_size() {
    let dataset = make_dataset(2);
    let _ = DataLoader::new(&dataset, 0);
}

#[test]
fn test_empty_dataset() {
    let dataset = make_dataset(0);
    let loader = DataLoader::new(&dataset, 4);
    assert!(loader.is_empty());
    assert_eq!(loader.iter().count(), 0);
}
