use crate::errors::TensorError;
use crate::tensor::Tensor;

fn sample_matrix() -> Tensor {
    let data: Vec<f32> = (0..12).map(|x| x as f32).collect();
    Tensor::new(&data, &[4, 3])
}

#[test]
fn test_rows() {
    let tensor = sample_matrix();
    let rows = tensor.rows(1..3).unwrap();
    assert_eq!(rows.shape(), &[2, 3]);
    assert_eq!(rows.data_as_slice(), &[3., 4., 5., 6., 7., 8.]);

    let empty = tensor.rows(2..2).unwrap();
    assert_eq!(empty.shape(), &[0, 3]);
}

#[test]
fn test_rows_out_of_bounds() {
    let tensor = sample_matrix();
    assert_eq!(
        tensor.rows(2..5),
        Err(TensorError::RowOutOfBounds { index: 5, len: 4 })
    );
}

#[test]
fn test_select_rows() {
    let tensor = sample_matrix();
    let selected = tensor.select_rows(&[3, 0, 3]).unwrap();
    assert_eq!(selected.shape(), &[3, 3]);
    assert_eq!(
        selected.data_as_slice(),
        &[9., 10., 11., 0., 1., 2., 9., 10., 11.]
    );
    assert!(tensor.select_rows(&[4]).is_err());
}

#[test]
fn test_select_rows_on_scalar() {
    let scalar = Tensor::new(&[1.], &[]);
    assert!(scalar.select_rows(&[0]).is_err());
}
