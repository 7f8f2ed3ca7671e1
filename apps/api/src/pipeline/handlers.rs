use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::entitlements::{self, SubscriptionStatus, Tier};
use crate::errors::AppError;
use crate::models::document::DocumentRecordRow;
use crate::models::template::TemplateRow;
use crate::pipeline::{entitlement_of, DownloadLinks, GenerateRequest, GenerationOutcome};
use crate::state::AppState;

const DOCUMENT_LIST_LIMIT: i64 = 50;

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecordRow>,
}

#[derive(Serialize)]
pub struct DocumentDetailResponse {
    pub document: DocumentRecordRow,
    #[serde(flatten)]
    pub links: DownloadLinks,
}

#[derive(Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateRow>,
}

#[derive(Serialize)]
pub struct UsageResponse {
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub usage: i64,
    pub limit: i64,
    /// `None` for unlimited tiers.
    pub remaining: Option<i64>,
    pub can_generate: bool,
}

/// POST /api/v1/documents/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerationOutcome>), AppError> {
    let today = Local::now().date_naive();
    let outcome = state.pipeline.run(auth, req, today).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/documents
pub async fn handle_list_documents(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state
        .store
        .list_documents(auth.organization_id, DOCUMENT_LIST_LIMIT)
        .await?;
    Ok(Json(DocumentListResponse { documents }))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentDetailResponse>, AppError> {
    let document = state
        .store
        .get_document(auth.organization_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
    let links = state.pipeline.download_links(&document).await?;
    Ok(Json(DocumentDetailResponse { document, links }))
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<TemplateListResponse>, AppError> {
    let templates = state.store.list_templates().await?;
    Ok(Json(TemplateListResponse { templates }))
}

/// GET /api/v1/usage
pub async fn handle_usage(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<UsageResponse>, AppError> {
    let org = state
        .store
        .get_organization(auth.organization_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let (tier, status) = entitlement_of(&org)?;

    Ok(Json(UsageResponse {
        tier,
        status,
        usage: org.usage_count,
        limit: tier.limit(),
        remaining: entitlements::remaining(tier, org.usage_count),
        can_generate: entitlements::check(tier, status, org.usage_count).is_allowed(),
    }))
}
