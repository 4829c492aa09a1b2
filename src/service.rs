//! The serving boundary: a single-flight lazy classifier handle and the
//! axum router exposing it.
//!
//! The classifier is orders of magnitude more expensive to construct than to
//! invoke, so it is loaded at most once per process and shared read-only by
//! every request. The handle is owned by the HTTP layer and passed into
//! handlers through axum state rather than living in a process-wide global.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;

use crate::classifier::{Classifier, ClassifierError};
use crate::models::{PretrainedVocab, Quantization};
use crate::runtime::RuntimeConfig;

/// Everything the lazy loader needs to assemble the classifier.
#[derive(Debug)]
pub struct ServiceConfig {
    pub model_dir: PathBuf,
    pub labels_path: PathBuf,
    pub vocab: PretrainedVocab,
    pub quantization: Quantization,
    pub runtime_config: RuntimeConfig,
}

/// Single-flight lazy initializer for the shared classifier.
pub struct ClassifierHandle {
    config: ServiceConfig,
    cell: OnceCell<Arc<Classifier>>,
}

impl ClassifierHandle {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Returns the shared classifier, loading it on first use.
    ///
    /// Concurrent first calls trigger exactly one load; every caller
    /// observes the same completed instance. Construction is blocking file
    /// I/O plus CPU work, so it runs on the blocking pool.
    pub async fn get(&self) -> Result<Arc<Classifier>, ClassifierError> {
        load_once(&self.cell, || async {
            let model_dir = self.config.model_dir.clone();
            let labels_path = self.config.labels_path.clone();
            let vocab = self.config.vocab;
            let quantization = self.config.quantization;
            let runtime_config = self.config.runtime_config.clone();

            tokio::task::spawn_blocking(move || {
                let started = Instant::now();
                let classifier = Classifier::builder()
                    .with_runtime_config(runtime_config)
                    .with_quantization(quantization)
                    .with_pretrained_vocab(vocab)?
                    .with_model_dir(&model_dir)?
                    .with_labels_file(&labels_path)?
                    .build()?;
                info!("Classifier loaded in {:.2?}", started.elapsed());
                Ok(Arc::new(classifier))
            })
            .await
            .map_err(|e| ClassifierError::BuildError(format!("Classifier load task failed: {}", e)))?
        })
        .await
    }
}

/// Resolves `cell` at most once: the first caller runs `loader`, concurrent
/// callers wait for it, and everyone shares the stored value. A failed load
/// is not cached, so a later call may retry.
pub(crate) async fn load_once<T, E, F, Fut>(
    cell: &OnceCell<Arc<T>>,
    loader: F,
) -> Result<Arc<T>, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<Arc<T>, E>>,
{
    let value = cell.get_or_try_init(loader).await?;
    Ok(Arc::clone(value))
}

/// Shared application state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ClassifierHandle>,
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/categorize", post(categorize))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: String,
    pub confidence: f32,
    pub latency_ms: u64,
}

/// Categorizes one message. Input content never produces a client error:
/// any text, including empty, yields a best-effort category. Failures here
/// are internal faults and map to 5xx.
async fn categorize(
    State(state): State<AppState>,
    Json(request): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, StatusCode> {
    let classifier = state.classifier.get().await.map_err(|e| {
        error!("Classifier unavailable: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let started = Instant::now();
    let prediction = tokio::task::spawn_blocking(move || classifier.predict(&request.message))
        .await
        .map_err(|e| {
            error!("Prediction task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Prediction failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(CategorizeResponse {
        category: prediction.category,
        confidence: prediction.confidence,
        latency_ms: started.elapsed().as_millis() as u64,
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
