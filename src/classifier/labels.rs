use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;

use super::error::ClassifierError;

/// Immutable mapping between class indices `{0..N-1}` and category names,
/// produced by the training pipeline and loaded verbatim at serving time.
///
/// Serialized as a JSON array of category names ordered by class index
/// (`["alimentacao", "lazer", ...]`). The mapping must stay consistent with
/// the model's output dimensionality; the builder validates that before the
/// classifier is marked ready, so an out-of-range decode at request time is
/// an internal fault, not an input error.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Label encoder defines no classes".into(),
            ));
        }
        let mut index = HashMap::with_capacity(classes.len());
        for (i, name) in classes.iter().enumerate() {
            if name.is_empty() {
                return Err(ClassifierError::ValidationError(format!(
                    "Class {} has an empty name",
                    i
                )));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(ClassifierError::ValidationError(format!(
                    "Duplicate class name '{}'",
                    name
                )));
            }
        }
        Ok(Self { classes, index })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ClassifierError::ValidationError(format!(
                "Failed to read label encoder {}: {}",
                path.display(),
                e
            ))
        })?;
        let classes: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| {
            ClassifierError::ValidationError(format!(
                "Malformed label encoder {}: {}",
                path.display(),
                e
            ))
        })?;
        let encoder = Self::new(classes)?;
        info!(
            "Loaded {} classes from {}",
            encoder.len(),
            path.display()
        );
        Ok(encoder)
    }

    /// Maps a class index back to its category name. Fails loudly when the
    /// index is out of range, which can only happen if the loader's
    /// dimensionality validation was bypassed.
    pub fn decode(&self, index: usize) -> Result<&str, ClassifierError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                ClassifierError::PredictionError(format!(
                    "Class index {} out of range (0..{})",
                    index,
                    self.classes.len()
                ))
            })
    }

    /// Training-side direction of the mapping; kept for completeness.
    pub fn encode(&self, category: &str) -> Option<usize> {
        self.index.get(category).copied()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn write_temp_labels(name: &str, contents: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("fincat-labels-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    fn sample_encoder() -> LabelEncoder {
        LabelEncoder::new(vec![
            "alimentacao".to_string(),
            "lazer".to_string(),
            "transporte".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn decode_and_encode_are_inverse() {
        let encoder = sample_encoder();
        for (i, name) in encoder.classes().iter().enumerate() {
            assert_eq!(encoder.decode(i).unwrap(), name);
            assert_eq!(encoder.encode(name), Some(i));
        }
        assert_eq!(encoder.encode("inexistente"), None);
    }

    #[test]
    fn decode_out_of_range_fails_loudly() {
        let encoder = sample_encoder();
        let err = encoder.decode(3).unwrap_err();
        assert!(matches!(err, ClassifierError::PredictionError(_)));
    }

    #[test]
    fn empty_class_set_is_rejected() {
        assert!(LabelEncoder::new(vec![]).is_err());
    }

    #[test]
    fn duplicate_class_names_are_rejected() {
        let result = LabelEncoder::new(vec!["lazer".to_string(), "lazer".to_string()]);
        assert!(matches!(
            result,
            Err(ClassifierError::ValidationError(_))
        ));
    }

    #[test]
    fn loads_from_json_file() {
        let path = write_temp_labels("ok.json", r#"["alimentacao", "transporte"]"#);
        let encoder = LabelEncoder::from_file(&path).unwrap();
        assert_eq!(encoder.len(), 2);
        assert_eq!(encoder.decode(1).unwrap(), "transporte");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_is_rejected() {
        let path = write_temp_labels("bad.json", r#"{"not": "an array"}"#);
        assert!(LabelEncoder::from_file(&path).is_err());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_rejected() {
        assert!(LabelEncoder::from_file("/nonexistent/label_encoder.json").is_err());
    }
}
