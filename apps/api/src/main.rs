mod auth;
mod backends;
mod config;
mod db;
mod documents;
mod entitlements;
mod errors;
mod models;
mod pipeline;
mod prompting;
mod render;
mod routes;
mod sanitizer;
mod state;
mod storage;
mod store;
mod support;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backends::anthropic::AnthropicBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::{BackendRouter, GenerationBackend};
use crate::config::Config;
use crate::db::create_pool;
use crate::documents::DocumentRegistry;
use crate::pipeline::persistence::ArtifactCoordinator;
use crate::pipeline::{GenerationPipeline, GenerationSettings};
use crate::render::{ArtifactFormat, PandocRenderer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3BlobStore;
use crate::store::{PgStore, PipelineStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LexDraft API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store: Arc<dyn PipelineStore> = Arc::new(PgStore::new(db));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let blobs = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    info!("S3 blob store initialized (bucket: {})", config.s3_bucket);

    // Assemble the fallback chain in priority order; the local stub is implicit
    let router = Arc::new(BackendRouter::new(
        build_backends(&config),
        config.backend_timeout(),
    ));
    info!(
        "Generation backends: {} (timeout {}s per attempt)",
        router.backend_ids().join(" -> "),
        config.backend_timeout_secs
    );

    let coordinator = ArtifactCoordinator::new(
        Arc::new(PandocRenderer::new(&config.pandoc_path, ArtifactFormat::Docx)),
        Arc::new(PandocRenderer::new(&config.pandoc_path, ArtifactFormat::Pdf)),
        blobs.clone(),
        store.clone(),
    );

    let pipeline = Arc::new(GenerationPipeline::new(
        Arc::new(DocumentRegistry::standard()),
        router,
        coordinator,
        store.clone(),
        blobs,
        GenerationSettings {
            temperature: config.generation_temperature,
            max_tokens: config.generation_max_tokens,
            download_ttl: config.download_url_ttl(),
        },
    ));

    // Build app state
    let state = AppState { pipeline, store };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Registers every backend that has credentials, in fixed priority order.
fn build_backends(config: &Config) -> Vec<Arc<dyn GenerationBackend>> {
    let client = reqwest::Client::new();
    let mut backends: Vec<Arc<dyn GenerationBackend>> = Vec::new();

    match &config.anthropic_api_key {
        Some(key) => backends.push(Arc::new(AnthropicBackend::new(client.clone(), key.clone()))),
        None => warn!("ANTHROPIC_API_KEY not set; anthropic backend disabled"),
    }
    match &config.openai_api_key {
        Some(key) => backends.push(Arc::new(OpenAiBackend::new(client.clone(), key.clone()))),
        None => warn!("OPENAI_API_KEY not set; openai backend disabled"),
    }

    backends
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "lexdraft-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
