use std::sync::Arc;

use crate::pipeline::GenerationPipeline;
use crate::store::PipelineStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator is assembled once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<GenerationPipeline>,
    /// Read paths (listings, usage) go straight to the store.
    pub store: Arc<dyn PipelineStore>,
}
