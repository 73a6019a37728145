//! Flatten / Dense / 激活函数单元测试

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, ArrayD, Ix2, IxDyn, array};

use crate::nn::{Activation, Dense, Flatten, Layer, Loss};

#[test]
fn test_flatten_forward_backward_shapes() {
    let mut flatten = Flatten::new("flatten", &[2, 3]);
    let input = ArrayD::from_shape_fn(IxDyn(&[4, 2, 3]), |ix| (ix[0] * 6 + ix[1] * 3 + ix[2]) as f32);

    let output = flatten.forward(&input).unwrap();
    assert_eq!(output.shape(), &[4, 6]);
    assert_eq!(output[[1, 4]], 10.0);

    let grad = flatten.backward(&input, &output, &output).unwrap();
    assert_eq!(grad.shape(), &[4, 2, 3]);
    assert_eq!(grad, input);
    assert_eq!(flatten.num_params(), 0);
}

#[test]
fn test_flatten_rejects_wrong_sample_shape() {
    let flatten = Flatten::new("flatten", &[28, 28]);
    assert!(flatten.forward(&ArrayD::zeros(IxDyn(&[1, 27, 28]))).is_err());
    assert!(flatten.output_shape(&[784]).is_err());
    assert_eq!(flatten.output_shape(&[28, 28]).unwrap(), vec![784]);
}

#[test]
fn test_dense_seeded_init_is_deterministic() {
    let a = Dense::new_seeded("dense", 784, 128, Activation::Relu, 42);
    let b = Dense::new_seeded("dense", 784, 128, Activation::Relu, 42);
    let c = Dense::new_seeded("dense", 784, 128, Activation::Relu, 43);

    assert_eq!(a.kernel(), b.kernel());
    assert_ne!(a.kernel(), c.kernel());
    assert!(a.bias().iter().all(|&v| v == 0.0));

    let limit = (6.0f32 / (784 + 128) as f32).sqrt();
    assert!(a.kernel().iter().all(|v| v.abs() <= limit));
    assert_eq!(a.num_params(), 784 * 128 + 128);
}

#[test]
fn test_dense_forward_linear() {
    let dense = Dense::from_weights(
        "dense",
        array![[1.0f32, 2.0], [3.0, 4.0]],
        Array1::from(vec![0.5f32, -0.5]),
        Activation::Linear,
    )
    .unwrap();

    let out = dense.forward(&array![[1.0f32, 1.0]].into_dyn()).unwrap();
    assert_eq!(out, array![[4.5f32, 5.5]].into_dyn());
}

#[test]
fn test_dense_rejects_mismatched_bias() {
    let result = Dense::from_weights(
        "dense",
        Array2::zeros((2, 3)),
        Array1::zeros(2),
        Activation::Linear,
    );
    assert!(result.is_err());
}

#[test]
fn test_relu_and_softmax() {
    let z = array![[-1.0f32, 0.0, 2.0], [1000.0, 1000.0, 1000.0]];

    let relu = Activation::Relu.forward(z.clone());
    assert_eq!(relu, array![[0.0f32, 0.0, 2.0], [1000.0, 1000.0, 1000.0]]);

    let softmax = Activation::Softmax.forward(z);
    for row in softmax.rows() {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-6);
        assert!(row.iter().all(|v| v.is_finite()));
    }
    assert_abs_diff_eq!(softmax[[1, 0]], 1.0 / 3.0, epsilon = 1e-6);
}

/// 单层 softmax Dense + 交叉熵：解析梯度与数值梯度一致
#[test]
fn test_dense_softmax_gradient_matches_numeric() {
    let kernel = array![[0.2f32, -0.1, 0.4], [0.3, 0.1, -0.2]];
    let bias = Array1::from(vec![0.05f32, -0.05, 0.0]);
    let x = array![[0.5f32, -1.0], [1.5, 0.3]].into_dyn();
    let y = array![[0.0f32, 0.0, 1.0], [1.0, 0.0, 0.0]];

    let loss_of = |kernel: Array2<f32>| {
        let dense = Dense::from_weights("d", kernel, bias.clone(), Activation::Softmax).unwrap();
        let out = dense.forward(&x).unwrap().into_dimensionality::<Ix2>().unwrap();
        Loss::CategoricalCrossentropy.sum(&out.view(), &y.view()) / 2.0
    };

    let mut dense = Dense::from_weights("d", kernel.clone(), bias.clone(), Activation::Softmax).unwrap();
    let out = dense.forward(&x).unwrap();
    let out2 = out.view().into_dimensionality::<Ix2>().unwrap();
    let grad_out = Loss::CategoricalCrossentropy.gradient(&out2, &y.view()).into_dyn();
    let grad_in = dense.backward(&x, &out, &grad_out).unwrap();
    assert_eq!(grad_in.shape(), &[2, 2]);

    let eps = 1e-2f32;
    for i in 0..2 {
        for j in 0..3 {
            let mut plus = kernel.clone();
            plus[[i, j]] += eps;
            let mut minus = kernel.clone();
            minus[[i, j]] -= eps;
            let numeric = (loss_of(plus) - loss_of(minus)) / (2.0 * eps);
            assert_abs_diff_eq!(dense.grad_kernel()[[i, j]], numeric, epsilon = 1e-3);
        }
    }
}

#[test]
fn test_dense_parameters_named_after_layer() {
    let mut dense = Dense::new_seeded("dense_1", 4, 2, Activation::Softmax, 0);
    let names: Vec<String> = dense.parameters_mut().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["dense_1/kernel", "dense_1/bias"]);
}
