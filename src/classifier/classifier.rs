use std::sync::Arc;
use std::time::Instant;

use log::debug;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::TextEncoding;
use super::error::ClassifierError;
use super::labels::LabelEncoder;
use crate::models::{ModelCharacteristics, Quantization};
use crate::normalize::normalize_amounts;

/// A thread-safe categorizer for Portuguese financial messages, backed by a
/// fine-tuned ONNX sequence-classification model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are
/// thread-safe: the tokenizer, session, and label encoder are shared
/// read-only behind `Arc`, and prediction never mutates them. A single
/// instance can serve concurrent requests:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use std::thread;
/// use fincat::{Classifier, PretrainedVocab};
///
/// let classifier = Arc::new(
///     Classifier::builder()
///         .with_pretrained_vocab(PretrainedVocab::BertimbauBaseCased)?
///         .with_model_dir("/var/lib/fincat/model")?
///         .with_labels_file("label_encoder.json")?
///         .build()?,
/// );
///
/// let mut handles = vec![];
/// for _ in 0..3 {
///     let classifier = Arc::clone(&classifier);
///     handles.push(thread::spawn(move || {
///         classifier.predict("Recebi um Pix de R$ 50,00").unwrap();
///     }));
/// }
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub session: Arc<Session>,
    pub labels: Arc<LabelEncoder>,
    pub model_characteristics: ModelCharacteristics,
    pub quantization: Quantization,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

/// Outcome of a single classification.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// One of the categories known to the label encoder.
    pub category: String,
    /// Probability of the winning category, in (0, 1].
    pub confidence: f32,
}

impl TextEncoding for Classifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.model_characteristics.max_sequence_length)
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            num_classes: self.labels.len(),
            class_labels: self.labels.classes().to_vec(),
            max_sequence_length: self.model_characteristics.max_sequence_length,
            quantization: self.quantization,
        }
    }

    /// Categorizes a single message.
    ///
    /// Normalizes monetary amounts, encodes to the fixed token window, runs
    /// one forward pass, and decodes the most probable class. Deterministic
    /// for fixed artifacts, and total over input content: empty or
    /// pathological text yields a best-effort (low-confidence) category
    /// rather than an error.
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # use fincat::{Classifier, PretrainedVocab};
    /// # let classifier = Classifier::builder()
    /// #     .with_pretrained_vocab(PretrainedVocab::BertimbauBaseCased)?
    /// #     .with_model_dir("/var/lib/fincat/model")?
    /// #     .with_labels_file("label_encoder.json")?
    /// #     .build()?;
    /// let prediction = classifier.predict("Pagamento de R$ 1.234,56 realizado")?;
    /// println!("{} ({:.2})", prediction.category, prediction.confidence);
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let started = Instant::now();

        let normalized = normalize_amounts(text);
        let (index, confidence) = self.classify(&normalized)?;
        let category = self.labels.decode(index)?.to_owned();

        debug!("Total prediction time: {:.2?}", started.elapsed());
        Ok(Prediction {
            category,
            confidence,
        })
    }
}
