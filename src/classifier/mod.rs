pub mod builder;
mod classifier;
mod encoding;
mod error;
mod labels;
mod utils;

pub use builder::ClassifierBuilder;
pub use classifier::{Classifier, Prediction};
pub use error::ClassifierError;
pub use labels::LabelEncoder;

use crate::models::Quantization;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the loaded ONNX weights file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Number of categories the classifier was fine-tuned on
    pub num_classes: usize,
    /// Category names, ordered by class index
    pub class_labels: Vec<String>,
    /// Fixed token window every input is fitted to
    pub max_sequence_length: usize,
    /// Weights variant the session was built from
    pub quantization: Quantization,
}
