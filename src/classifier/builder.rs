use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use ort::session::Session;
use tokenizers::Tokenizer;

use super::classifier::Classifier;
use super::encoding::TextEncoding;
use super::error::ClassifierError;
use super::labels::LabelEncoder;
use crate::models::{ModelCharacteristics, PretrainedVocab, Quantization, MAX_SEQUENCE_LENGTH};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelManager;

/// A builder for constructing a Classifier with a fluent interface.
///
/// Loading order matters for two settings: the runtime configuration and the
/// quantization variant must be set before `with_model_dir`, because the
/// session is created eagerly at that point.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    labels: Option<LabelEncoder>,
    max_sequence_length: Option<usize>,
    runtime_config: RuntimeConfig,
    quantization: Quantization,
}

impl TextEncoding for ClassifierBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.max_sequence_length.unwrap_or(MAX_SEQUENCE_LENGTH))
    }
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Selects which weights variant `with_model_dir` will load. The int8
    /// variant trades a small accuracy loss for CPU latency and memory.
    pub fn with_quantization(mut self, quantization: Quantization) -> Self {
        self.quantization = quantization;
        self
    }

    /// Overrides the fixed sequence length (defaults to the 64-token window
    /// the production model was fine-tuned with).
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = Some(max_sequence_length);
        self
    }

    /// Loads the tokenizer of a fixed pretrained vocabulary from the local
    /// artifact cache.
    ///
    /// # Errors
    /// Returns a `BuildError` if a tokenizer is already set, the cache is
    /// unavailable, or the tokenizer has not been fetched yet (see
    /// [`ModelManager::ensure_tokenizer`]).
    pub fn with_pretrained_vocab(mut self, vocab: PretrainedVocab) -> Result<Self, ClassifierError> {
        if self.tokenizer.is_some() {
            return Err(ClassifierError::BuildError(
                "Tokenizer already set".to_string(),
            ));
        }

        let manager = ModelManager::new_default().map_err(|e| {
            ClassifierError::BuildError(format!("Failed to open artifact cache: {}", e))
        })?;
        let tokenizer_path = manager
            .tokenizer_file(vocab)
            .map_err(|e| ClassifierError::BuildError(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded for {}", vocab.info().hub_id);

        if self.max_sequence_length.is_none() {
            self.max_sequence_length = Some(vocab.characteristics().max_sequence_length);
        }
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        Ok(self)
    }

    /// Loads the tokenizer from an explicit `tokenizer.json` path.
    pub fn with_tokenizer_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if self.tokenizer.is_some() {
            return Err(ClassifierError::BuildError(
                "Tokenizer already set".to_string(),
            ));
        }
        if !path.exists() {
            return Err(ClassifierError::BuildError(format!(
                "Tokenizer file not found: {}",
                path.display()
            )));
        }

        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded from {}", path.display());

        self.tokenizer_path = Some(path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        Ok(self)
    }

    /// Creates the inference session from the model artifact directory,
    /// picking the weights file the configured quantization selects.
    ///
    /// # Errors
    /// Returns a `BuildError` if the session is already set, the directory or
    /// weights file is missing, or the ONNX graph lacks the expected inputs
    /// and outputs.
    pub fn with_model_dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self, ClassifierError> {
        let dir = dir.as_ref();
        if self.session.is_some() {
            return Err(ClassifierError::BuildError(
                "Model already set".to_string(),
            ));
        }
        if !dir.is_dir() {
            return Err(ClassifierError::BuildError(format!(
                "Model directory not found: {}",
                dir.display()
            )));
        }

        let weights_path = dir.join(self.quantization.weights_file());
        if !weights_path.exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model weights not found: {} (quantization {:?})",
                weights_path.display(),
                self.quantization
            )));
        }

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&weights_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(weights_path.to_string_lossy().to_string());
        self.session = Some(session);
        Ok(self)
    }

    /// Loads the label encoder from its serialized JSON file.
    pub fn with_labels_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ClassifierError> {
        let labels = LabelEncoder::from_file(path).map_err(|e| match e {
            ClassifierError::ValidationError(msg) => ClassifierError::BuildError(msg),
            other => other,
        })?;
        self.labels = Some(labels);
        Ok(self)
    }

    /// Uses an already-constructed label encoder.
    pub fn with_labels(mut self, labels: LabelEncoder) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Builds and returns the final Classifier instance.
    ///
    /// Before handing the classifier out, runs one probe forward pass and
    /// checks that the model's logit count matches the label encoder's class
    /// count: the two artifacts are produced independently by the training
    /// pipeline, and a mismatch between them must abort startup rather than
    /// surface as wrong categories at request time.
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        if self.tokenizer.is_none() || self.tokenizer_path.is_none() {
            return Err(ClassifierError::BuildError(
                "No tokenizer loaded".to_string(),
            ));
        }
        if self.session.is_none() || self.model_path.is_none() {
            return Err(ClassifierError::BuildError(
                "No ONNX model loaded".to_string(),
            ));
        }
        let labels = self
            .labels
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No label encoder loaded".to_string()))?;

        let (ids, mask) = self.encode_text("mensagem de teste")?;
        let logits = self.run_model(&ids, &mask)?;
        if logits.len() != labels.len() {
            return Err(ClassifierError::BuildError(format!(
                "Model outputs {} classes but the label encoder defines {}",
                logits.len(),
                labels.len()
            )));
        }

        let model_characteristics = ModelCharacteristics {
            max_sequence_length: self.max_sequence_length.unwrap_or(MAX_SEQUENCE_LENGTH),
        };

        let classifier = Classifier {
            model_path: self.model_path.take().unwrap(),
            tokenizer_path: self.tokenizer_path.take().unwrap(),
            tokenizer: Arc::new(self.tokenizer.take().unwrap()),
            session: Arc::new(self.session.take().unwrap()),
            labels: Arc::new(labels),
            model_characteristics,
            quantization: self.quantization,
        };
        info!(
            "Classifier ready: {} classes, sequence length {}",
            classifier.labels.len(),
            classifier.model_characteristics.max_sequence_length
        );
        Ok(classifier)
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        for required in ["input_ids", "attention_mask"] {
            if !session.inputs.iter().any(|input| input.name == required) {
                return Err(ClassifierError::ModelError(format!(
                    "Model is missing required input '{}'",
                    required
                )));
            }
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string(),
            ));
        }
        Ok(())
    }
}
