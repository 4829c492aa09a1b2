//! End-to-end tests against a real fine-tuned artifact set.
//!
//! These run only when FINCAT_TEST_MODEL_DIR points at a directory holding
//! model.onnx, tokenizer.json and label_encoder.json; otherwise they skip,
//! since the fine-tuned model is a private artifact not shipped with the
//! repository.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use fincat::Classifier;

fn test_model_dir() -> Option<PathBuf> {
    match env::var("FINCAT_TEST_MODEL_DIR") {
        Ok(dir) => Some(PathBuf::from(dir)),
        Err(_) => {
            eprintln!("FINCAT_TEST_MODEL_DIR not set, skipping");
            None
        }
    }
}

fn build_classifier(dir: &Path) -> Classifier {
    Classifier::builder()
        .with_tokenizer_file(dir.join("tokenizer.json"))
        .unwrap()
        .with_model_dir(dir)
        .unwrap()
        .with_labels_file(dir.join("label_encoder.json"))
        .unwrap()
        .build()
        .expect("Failed to build classifier from FINCAT_TEST_MODEL_DIR")
}

#[test]
fn prediction_is_deterministic() {
    let Some(dir) = test_model_dir() else { return };
    let classifier = build_classifier(&dir);

    let first = classifier.predict("Recebi um Pix de R$ 50,00").unwrap();
    let second = classifier.predict("Recebi um Pix de R$ 50,00").unwrap();
    assert_eq!(first.category, second.category);
    assert_eq!(first.confidence, second.confidence);
}

#[test]
fn prediction_is_a_known_category() {
    let Some(dir) = test_model_dir() else { return };
    let classifier = build_classifier(&dir);
    let known = classifier.info().class_labels;

    let prediction = classifier
        .predict("Pagamento de R$ 1.234,56 realizado no cartao")
        .unwrap();
    assert!(known.contains(&prediction.category));
    assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
}

#[test]
fn empty_input_still_classifies() {
    let Some(dir) = test_model_dir() else { return };
    let classifier = build_classifier(&dir);
    let known = classifier.info().class_labels;

    let prediction = classifier.predict("").unwrap();
    assert!(known.contains(&prediction.category));
}

#[test]
fn long_input_is_truncated_not_rejected() {
    let Some(dir) = test_model_dir() else { return };
    let classifier = build_classifier(&dir);

    let long_message = "transferencia de R$ 10,00 para conta corrente ".repeat(50);
    assert!(classifier.predict(&long_message).is_ok());
}

#[test]
fn concurrent_predictions_share_one_classifier() {
    let Some(dir) = test_model_dir() else { return };
    let classifier = Arc::new(build_classifier(&dir));

    let mut handles = vec![];
    for i in 0..4 {
        let classifier = Arc::clone(&classifier);
        handles.push(thread::spawn(move || {
            classifier
                .predict(&format!("Compra de R$ {}0,00 no mercado", i + 1))
                .unwrap()
        }));
    }

    let known = classifier.info().class_labels;
    for handle in handles {
        let prediction = handle.join().unwrap();
        assert!(known.contains(&prediction.category));
    }
}
