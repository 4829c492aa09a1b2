//! A thread-safe categorizer for short Portuguese financial messages, served
//! over HTTP and backed by a fine-tuned ONNX sequence-classification model.
//!
//! The pipeline per request: monetary amounts are collapsed to a placeholder
//! token, the text is encoded to a fixed 64-token window, one forward pass
//! produces logits, and softmax + argmax select the category decoded through
//! the label encoder. Artifacts (tokenizer, model, label encoder) are loaded
//! once at startup and shared read-only across concurrent requests.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use fincat::{Classifier, PretrainedVocab};
//!
//! let classifier = Classifier::builder()
//!     .with_pretrained_vocab(PretrainedVocab::BertimbauBaseCased)?
//!     .with_model_dir("/var/lib/fincat/model")?
//!     .with_labels_file("label_encoder.json")?
//!     .build()?;
//!
//! let prediction = classifier.predict("Recebi um Pix de R$ 50,00")?;
//! println!("{} ({:.2})", prediction.category, prediction.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! The `fincat` binary wires the classifier behind `POST /categorize`; see
//! [`service`] for the router and the single-flight load semantics.

pub mod classifier;
pub mod model_manager;
pub mod models;
pub mod normalize;
mod runtime;
pub mod service;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, LabelEncoder, Prediction,
};
pub use model_manager::{ArtifactManifest, ModelError, ModelManager};
pub use models::{ModelCharacteristics, PretrainedVocab, Quantization, VocabInfo};
pub use normalize::normalize_amounts;
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
