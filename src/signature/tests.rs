use crate::signature::{ModelSignature, SignatureError, TensorSpec, infer_signature};
use crate::tensor::Tensor;

#[test]
fn test_infer_signature_for_mnist_batch() {
    let signature = infer_signature(&Tensor::zeros(&[5, 28, 28]), &Tensor::zeros(&[5, 10])).unwrap();

    assert_eq!(signature.inputs.len(), 1);
    assert_eq!(signature.inputs[0].shape, vec![-1, 28, 28]);
    assert_eq!(signature.inputs[0].dtype, "float32");
    assert_eq!(signature.outputs[0].shape, vec![-1, 10]);
}

#[test]
fn test_infer_signature_requires_batch_dimension() {
    let scalar = Tensor::new(&[1.0], &[]);
    assert!(matches!(
        infer_signature(&scalar, &Tensor::zeros(&[1, 10])),
        Err(SignatureError::MissingBatchDimension { .. })
    ));
}

#[test]
fn test_json_layout() {
    let signature = infer_signature(&Tensor::zeros(&[1, 28, 28]), &Tensor::zeros(&[1, 10])).unwrap();
    let json = signature.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let inputs = value["inputs"].as_str().unwrap();
    assert_eq!(
        inputs,
        r#"[{"type":"tensor","tensor-spec":{"dtype":"float32","shape":[-1,28,28]}}]"#
    );

    assert_eq!(ModelSignature::from_json(&json).unwrap(), signature);
}

#[test]
fn test_from_json_rejects_unknown_kind() {
    let json = r#"{"inputs": "[{\"type\": \"tensor\", \"tensor-spec\": {\"dtype\": \"float32\", \"shape\": [-1, 4]}}]", "outputs": "[{\"type\": \"column\", \"tensor-spec\": {\"dtype\": \"float32\", \"shape\": [-1]}}]"}"#;
    assert!(matches!(
        ModelSignature::from_json(json),
        Err(SignatureError::InvalidFormat(_))
    ));
    assert!(ModelSignature::from_json("not json").is_err());
}

#[test]
fn test_validate_input() {
    let signature = infer_signature(&Tensor::zeros(&[3, 28, 28]), &Tensor::zeros(&[3, 10])).unwrap();

    assert!(signature.validate_input(&Tensor::zeros(&[7, 28, 28])).is_ok());
    assert!(signature.validate_input(&Tensor::zeros(&[0, 28, 28])).is_ok());
    assert!(matches!(
        signature.validate_input(&Tensor::zeros(&[7, 784])),
        Err(SignatureError::InputMismatch { .. })
    ));

    let spec = TensorSpec {
        dtype: "float32".to_string(),
        shape: vec![-1, 2],
    };
    assert!(spec.matches(&[9, 2]));
    assert!(!spec.matches(&[9, 3]));
}
