//! 损失函数与准确率单元测试

use approx::assert_abs_diff_eq;
use ndarray::array;

use crate::nn::{Loss, Metric, PROB_EPSILON};

#[test]
fn test_cross_entropy_sum() {
    let p = array![[0.7f32, 0.2, 0.1], [0.1, 0.1, 0.8]];
    let y = array![[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0]];

    let sum = Loss::CategoricalCrossentropy.sum(&p.view(), &y.view());
    assert_abs_diff_eq!(sum, -(0.7f32.ln() + 0.1f32.ln()), epsilon = 1e-5);
}

#[test]
fn test_cross_entropy_clips_zero_probability() {
    let p = array![[0.0f32, 1.0]];
    let y = array![[1.0f32, 0.0]];

    let sum = Loss::CategoricalCrossentropy.sum(&p.view(), &y.view());
    assert!(sum.is_finite());
    assert_abs_diff_eq!(sum, -PROB_EPSILON.ln(), epsilon = 1e-3);
}

#[test]
fn test_cross_entropy_gradient_is_batch_mean() {
    let p = array![[0.5f32, 0.5], [0.25, 0.75]];
    let y = array![[1.0f32, 0.0], [0.0, 1.0]];

    let grad = Loss::CategoricalCrossentropy.gradient(&p.view(), &y.view());
    assert_abs_diff_eq!(grad[[0, 0]], -1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(grad[[0, 1]], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(grad[[1, 1]], -1.0 / 0.75 / 2.0, epsilon = 1e-5);
}

#[test]
fn test_accuracy_counts_argmax_matches() {
    let p = array![[0.7f32, 0.2, 0.1], [0.1, 0.1, 0.8], [0.3, 0.4, 0.3]];
    let y = array![[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

    assert_eq!(Metric::Accuracy.count_correct(&p.view(), &y.view()), 2);
}

#[test]
fn test_names() {
    assert_eq!(Loss::default().name(), "categorical_crossentropy");
    assert_eq!(Metric::default().name(), "accuracy");
}
