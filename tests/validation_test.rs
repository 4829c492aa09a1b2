use std::env;
use std::fs;

use fincat::{Classifier, ClassifierError, LabelEncoder, Quantization};

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let path = env::temp_dir().join(format!("fincat-validation-{}-{}", std::process::id(), name));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn missing_model_directory_fails_the_build_step() {
    let result = Classifier::builder().with_model_dir("/nonexistent/fincat-model");
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
}

#[test]
fn missing_quantized_weights_are_reported() {
    // An existing directory without the int8 export must fail before any
    // session is created.
    let dir = env::temp_dir().join(format!("fincat-empty-model-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let result = Classifier::builder()
        .with_quantization(Quantization::Int8)
        .with_model_dir(&dir);
    match result {
        Err(ClassifierError::BuildError(msg)) => assert!(msg.contains("Int8")),
        other => panic!("expected BuildError, got {:?}", other.map(|_| ())),
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_tokenizer_file_is_rejected() {
    let result = Classifier::builder().with_tokenizer_file("/nonexistent/tokenizer.json");
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
}

#[test]
fn malformed_label_encoder_is_rejected() {
    let path = temp_file("labels-bad.json", "not json at all");
    let result = Classifier::builder().with_labels_file(&path);
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    let _ = fs::remove_file(path);
}

#[test]
fn empty_label_encoder_is_rejected() {
    let path = temp_file("labels-empty.json", "[]");
    let result = Classifier::builder().with_labels_file(&path);
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    let _ = fs::remove_file(path);
}

#[test]
fn build_without_artifacts_is_rejected() {
    let labels = LabelEncoder::new(vec!["alimentacao".to_string(), "lazer".to_string()]).unwrap();
    let result = Classifier::builder().with_labels(labels).build();
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
}
