use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::utils::{argmax, softmax};

/// Turns text into the fixed-length encoding the classification model was
/// fine-tuned on and runs the forward pass.
///
/// The ONNX graph is expected to:
/// - Accept `input_ids` and `attention_mask` of shape [batch_size, sequence_length]
///   (plus `token_type_ids` when the export declares it)
/// - Output one logits row per input, shape [batch_size, num_labels]
pub(crate) trait TextEncoding {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the fixed sequence length the model was fine-tuned with
    fn max_sequence_length(&self) -> Option<usize>;

    /// Encodes text (with special tokens) into `input_ids` and
    /// `attention_mask`, right-truncated and zero-padded to the fixed
    /// sequence length.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded
    fn encode_text(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>), ClassifierError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self
            .max_sequence_length()
            .ok_or_else(|| ClassifierError::TokenizerError("Max sequence length not set".into()))?;

        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        pad_or_truncate(&mut ids, max_length, 0);
        pad_or_truncate(&mut mask, max_length, 0);

        Ok((ids, mask))
    }

    /// Runs the forward pass and returns the raw logits row.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation, execution, or output extraction fails
    fn run_model(&self, ids: &[i64], mask: &[i64]) -> Result<Vec<f32>, ClassifierError> {
        let session = self
            .session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;

        // BERT exports differ on whether they take segment ids; feed them
        // only when the graph declares the input.
        let wants_token_types = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let input_array = Array2::from_shape_vec((1, ids.len()), ids.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_array = Array2::from_shape_vec((1, mask.len()), mask.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let type_dyn = Array2::<i64>::zeros((1, ids.len())).into_dyn();
        let token_type_ids = type_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(&input_ids).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create input tensor: {}", e))
            })?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(&attention_mask).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e))
            })?,
        );
        if wants_token_types {
            input_tensors.insert(
                "token_type_ids",
                Tensor::from_array(&token_type_ids).map_err(|e| {
                    ClassifierError::ModelError(format!("Failed to create segment tensor: {}", e))
                })?,
            );
        }

        let outputs = session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let logits = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e))
        })?;

        if logits.ndim() != 2 {
            return Err(ClassifierError::ModelError(format!(
                "Expected [batch, num_labels] logits, got shape {:?}",
                logits.shape()
            )));
        }

        let row = logits.slice(ndarray::s![0, ..]);
        Ok(row.iter().cloned().collect())
    }

    /// Full single-input classification: encode, forward pass, softmax,
    /// argmax. Returns the winning class index and its probability.
    ///
    /// Tokenization and inference latencies are logged separately; both
    /// stages are candidate bottlenecks and the quantization trade-off is
    /// only verifiable when they can be told apart.
    fn classify(&self, text: &str) -> Result<(usize, f32), ClassifierError> {
        let tokenize_start = Instant::now();
        let (ids, mask) = self.encode_text(text)?;
        debug!("Tokenization completed in {:.2?}", tokenize_start.elapsed());

        let inference_start = Instant::now();
        let logits = self.run_model(&ids, &mask)?;
        debug!(
            "Model inference completed in {:.2?}",
            inference_start.elapsed()
        );

        let probs = softmax(&logits);
        argmax(&probs)
            .ok_or_else(|| ClassifierError::ModelError("Model produced an empty logits row".into()))
    }
}

/// Fits `values` to exactly `len` elements: right-truncates longer inputs and
/// pads shorter ones with `pad`.
pub(crate) fn pad_or_truncate(values: &mut Vec<i64>, len: usize, pad: i64) {
    values.resize(len, pad);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_padded() {
        let mut values = vec![101, 7592, 102];
        pad_or_truncate(&mut values, 8, 0);
        assert_eq!(values, vec![101, 7592, 102, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn long_input_is_right_truncated() {
        let mut values: Vec<i64> = (0..10).collect();
        pad_or_truncate(&mut values, 4, 0);
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn exact_length_is_unchanged() {
        let mut values = vec![1, 2, 3];
        pad_or_truncate(&mut values, 3, 0);
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn empty_input_becomes_all_padding() {
        let mut values = Vec::new();
        pad_or_truncate(&mut values, 4, 0);
        assert_eq!(values, vec![0, 0, 0, 0]);
    }
}
