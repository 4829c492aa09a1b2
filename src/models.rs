//! The fixed artifact contract shared by the loader and the artifact manager.
//!
//! A fine-tuned model artifact is a directory holding the ONNX export of the
//! classifier under these exact filenames. The label encoder lives outside
//! that directory, next to the process working directory, because it is
//! produced by the training pipeline independently of the ONNX export.

/// Full-precision weights file inside the model artifact directory.
pub const MODEL_WEIGHTS: &str = "model.onnx";

/// Int8 dynamic-quantized weights variant, present when the export pipeline
/// emitted one.
pub const MODEL_WEIGHTS_INT8: &str = "model.quantized.onnx";

/// Manifest listing the artifact files and their sha256 digests.
pub const ARTIFACT_MANIFEST: &str = "manifest.json";

/// Serialized label encoder, resolved against the working directory.
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

/// Token window the classifier was fine-tuned with. Longer inputs are
/// truncated, shorter ones padded, so every forward pass sees this length.
pub const MAX_SEQUENCE_LENGTH: usize = 64;

/// The pretrained vocabularies the classifier can be served with. The
/// vocabulary is fixed at fine-tuning time and is not configurable per
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PretrainedVocab {
    /// `neuralmind/bert-base-portuguese-cased` (BERTimbau), the vocabulary
    /// the production classifier was fine-tuned from.
    BertimbauBaseCased,
}

/// Static information about a pretrained vocabulary.
#[derive(Debug, Clone)]
pub struct VocabInfo {
    /// Directory name used inside the local cache.
    pub name: &'static str,
    /// Hub identifier the vocabulary was published under.
    pub hub_id: &'static str,
    /// Where the serialized tokenizer can be fetched from.
    pub tokenizer_url: &'static str,
}

impl PretrainedVocab {
    pub fn info(&self) -> VocabInfo {
        match self {
            Self::BertimbauBaseCased => VocabInfo {
                name: "bertimbau-base-cased",
                hub_id: "neuralmind/bert-base-portuguese-cased",
                tokenizer_url:
                    "https://huggingface.co/neuralmind/bert-base-portuguese-cased/resolve/main/tokenizer.json",
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        ModelCharacteristics {
            max_sequence_length: MAX_SEQUENCE_LENGTH,
        }
    }
}

/// Which weights variant the loader opens. Int8 shrinks the memory footprint
/// and speeds up CPU inference at a small accuracy cost; once a session is
/// built from the quantized file there is no path back to full precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quantization {
    #[default]
    None,
    Int8,
}

impl Quantization {
    /// The weights filename this variant loads from the artifact directory.
    pub fn weights_file(&self) -> &'static str {
        match self {
            Self::None => MODEL_WEIGHTS,
            Self::Int8 => MODEL_WEIGHTS_INT8,
        }
    }
}

/// Serving-relevant characteristics of the loaded model.
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    pub max_sequence_length: usize,
}
