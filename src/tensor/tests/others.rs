use approx::assert_abs_diff_eq;

use crate::tensor::Tensor;

#[test]
fn test_div_scalar() {
    let tensor = Tensor::new(&[0., 51., 255.], &[3]);
    let divided = &tensor / 255.;
    assert_abs_diff_eq!(divided[[1]], 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!((tensor / 255.)[[2]], 1.0, epsilon = 1e-6);
}

#[test]
#[should_panic(expected = "除数为零")]
fn test_div_by_zero() {
    let tensor = Tensor::new(&[1., 2.], &[2]);
    let _ = &tensor / 0.;
}

#[test]
fn test_min_max_value() {
    let tensor = Tensor::new(&[-1., 3., 0.5], &[3]);
    assert_eq!(tensor.min_value(), -1.);
    assert_eq!(tensor.max_value(), 3.);
}

#[test]
fn test_max_abs_diff() {
    let a = Tensor::new(&[1., 2., 3.], &[3]);
    let b = Tensor::new(&[1., 2.5, 2.], &[3]);
    assert_abs_diff_eq!(a.max_abs_diff(&b).unwrap(), 1.0, epsilon = 1e-6);
    assert!(a.max_abs_diff(&Tensor::zeros(&[2])).is_err());
}
