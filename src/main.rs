use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;

use fincat::models::LABEL_ENCODER_FILE;
use fincat::service::{build_router, AppState, ClassifierHandle, ServiceConfig};
use fincat::{ModelManager, PretrainedVocab, Quantization, RuntimeConfig};

#[derive(Parser)]
#[command(author, version, about = "Portuguese financial message categorizer", long_about = None)]
struct Args {
    /// Port to bind the HTTP server on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Directory containing the fine-tuned ONNX model artifact.
    /// Defaults to the MODEL_PATH environment variable.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Path to the serialized label encoder
    #[arg(long, default_value = LABEL_ENCODER_FILE)]
    labels: PathBuf,

    /// Serve the int8-quantized weights for faster CPU inference
    #[arg(long)]
    quantized: bool,

    /// Force a fresh download of the cached tokenizer
    #[arg(short, long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let model_dir = args
        .model_dir
        .or_else(|| env::var("MODEL_PATH").ok().map(PathBuf::from))
        .context("No model directory: pass --model-dir or set MODEL_PATH")?;

    let quantization = if args.quantized {
        Quantization::Int8
    } else {
        Quantization::None
    };
    let vocab = PretrainedVocab::BertimbauBaseCased;

    prepare_artifacts(&model_dir, vocab, quantization, args.fresh).await?;

    let handle = Arc::new(ClassifierHandle::new(ServiceConfig {
        model_dir,
        labels_path: args.labels,
        vocab,
        quantization,
        runtime_config: RuntimeConfig::default(),
    }));

    // Load eagerly: a broken artifact set must abort startup, not surface on
    // the first request.
    handle
        .get()
        .await
        .context("Failed to load classifier")?;

    let router = build_router(AppState {
        classifier: Arc::clone(&handle),
    });
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}

/// Resolves the startup preconditions the loader assumes: a cached tokenizer
/// and a complete model artifact directory.
async fn prepare_artifacts(
    model_dir: &Path,
    vocab: PretrainedVocab,
    quantization: Quantization,
    fresh: bool,
) -> anyhow::Result<()> {
    let manager = ModelManager::new_default().context("Failed to open artifact cache")?;

    if fresh {
        info!("Fresh download requested - removing cached tokenizer...");
        manager.remove_tokenizer(vocab)?;
    }
    manager
        .ensure_tokenizer(vocab)
        .await
        .context("Failed to fetch tokenizer")?;

    if !ModelManager::is_artifact_complete(model_dir, quantization) {
        let base_url = env::var("FINCAT_MODEL_URL").map_err(|_| {
            anyhow::anyhow!(
                "Model artifacts missing from {} and FINCAT_MODEL_URL is not set",
                model_dir.display()
            )
        })?;
        info!("Model artifacts missing from {:?}, downloading...", model_dir);
        manager
            .download_artifacts(&base_url, model_dir)
            .await
            .context("Failed to download model artifacts")?;

        if !ModelManager::is_artifact_complete(model_dir, quantization) {
            anyhow::bail!(
                "Model artifact set at {} is incomplete after download",
                model_dir.display()
            );
        }
    }

    Ok(())
}
