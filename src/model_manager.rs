use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::{PretrainedVocab, Quantization, ARTIFACT_MANIFEST};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Tokenizer not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid artifact manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),
    #[error("Artifact verification failed for {0}")]
    VerificationFailed(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Manifest emitted by the training pipeline next to the exported model:
/// artifact file name to sha256 digest.
#[derive(Debug, Deserialize)]
pub struct ArtifactManifest {
    pub files: BTreeMap<String, String>,
}

/// Retrieves and caches the serving artifacts: the fixed pretrained
/// tokenizer and, when a remote base URL is configured, the fine-tuned model
/// artifact set. The classifier builder only ever reads from local paths;
/// this manager is what puts the files there.
#[derive(Clone)]
pub struct ModelManager {
    cache_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default cache directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_cache_dir())
    }

    /// Returns the default tokenizer cache directory
    pub fn default_cache_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("FINCAT_CACHE") {
            return PathBuf::from(path).join("tokenizers");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("fincat").join("tokenizers");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("fincat").join("tokenizers");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("fincat").join("tokenizers")
    }

    pub fn new<P: AsRef<Path>>(cache_dir: P) -> io::Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn tokenizer_path(&self, vocab: PretrainedVocab) -> PathBuf {
        self.cache_dir.join(vocab.info().name).join("tokenizer.json")
    }

    pub fn is_tokenizer_downloaded(&self, vocab: PretrainedVocab) -> bool {
        self.tokenizer_path(vocab).exists()
    }

    /// Returns the cached tokenizer path, failing if it was never fetched.
    pub fn tokenizer_file(&self, vocab: PretrainedVocab) -> Result<PathBuf, ModelError> {
        let path = self.tokenizer_path(vocab);
        if !path.exists() {
            return Err(ModelError::NotDownloaded(format!(
                "Tokenizer for '{}' is not cached; fetch it with ModelManager::ensure_tokenizer()",
                vocab.info().hub_id
            )));
        }
        Ok(path)
    }

    /// Downloads the fixed pretrained tokenizer unless it is already cached.
    /// Safe under concurrent callers: the download lock serializes fetches
    /// and the cache is re-checked once the lock is held.
    pub async fn ensure_tokenizer(&self, vocab: PretrainedVocab) -> Result<PathBuf, ModelError> {
        let path = self.tokenizer_path(vocab);
        if self.is_tokenizer_downloaded(vocab) {
            return Ok(path);
        }

        let _lock = self.download_lock.lock().await;
        if path.exists() {
            return Ok(path);
        }

        let info = vocab.info();
        log::info!(
            "Downloading tokenizer for {} from {}",
            info.hub_id,
            info.tokenizer_url
        );
        Self::download_file(info.tokenizer_url, &path, None).await?;
        Ok(path)
    }

    pub fn remove_tokenizer(&self, vocab: PretrainedVocab) -> Result<(), ModelError> {
        let path = self.tokenizer_path(vocab);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// True when the artifact directory holds the weights file the selected
    /// quantization needs.
    pub fn is_artifact_complete(model_dir: &Path, quantization: Quantization) -> bool {
        model_dir.join(quantization.weights_file()).exists()
    }

    /// Fetches a fine-tuned model artifact set into `dest`.
    ///
    /// Reads `manifest.json` from the remote base URL, then downloads every
    /// listed file and verifies it against its sha256 digest. Files already
    /// present and matching their digest are kept. No retry logic: a failed
    /// transfer surfaces immediately and startup aborts.
    pub async fn download_artifacts(&self, base_url: &str, dest: &Path) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;
        fs::create_dir_all(dest)?;

        let base = base_url.trim_end_matches('/');
        let manifest_url = format!("{}/{}", base, ARTIFACT_MANIFEST);
        log::info!("Fetching artifact manifest from {}", manifest_url);
        let body = reqwest::get(&manifest_url)
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let manifest: ArtifactManifest = serde_json::from_slice(&body)?;

        for (file, hash) in &manifest.files {
            let url = format!("{}/{}", base, file);
            let path = dest.join(file);
            if path.exists() && Self::verify_file(&path, hash)? {
                log::info!("{} already present and verified", file);
                continue;
            }
            Self::download_file(&url, &path, Some(hash)).await?;
        }

        log::info!("Artifact set complete at {:?}", dest);
        Ok(())
    }

    fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        Ok(Self::sha256_hex(&bytes) == expected_hash)
    }

    fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    async fn download_file(
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} to {:?}", url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let actual = Self::sha256_hex(&bytes);
            if actual != expected {
                log::error!(
                    "Hash mismatch for {}: expected {}, got {}",
                    url,
                    expected,
                    actual
                );
                return Err(ModelError::HashMismatch {
                    file: url.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        // Verify what actually landed on disk
        if let Some(expected) = expected_hash {
            if !Self::verify_file(path, expected)? {
                return Err(ModelError::VerificationFailed(path.display().to_string()));
            }
        }
        Ok(())
    }
}
