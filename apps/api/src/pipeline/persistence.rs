//! Artifact Persistence Coordinator.
//!
//! Order: primary render + upload (fatal), secondary render + upload (non-fatal),
//! then one store commit that inserts the record and increments usage together.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::fields::FieldMap;
use crate::entitlements::{DenialReason, EntitlementDenial, Tier};
use crate::errors::AppError;
use crate::models::document::{DocumentRecordRow, DocumentStatus, NewDocumentRecord};
use crate::render::Renderer;
use crate::storage::{artifact_key, BlobStore};
use crate::store::{CommitOutcome, PipelineStore};

/// Everything needed to store one finished document.
pub struct ArtifactRequest<'a> {
    pub document_id: Uuid,
    pub organization_id: Uuid,
    pub actor_id: Uuid,
    pub document_type: &'a str,
    pub title: &'a str,
    pub text: &'a str,
    pub fields: &'a FieldMap,
    pub backend: &'a str,
    pub tier: Tier,
}

#[derive(Debug, Clone)]
pub struct PersistedDocument {
    pub record: DocumentRecordRow,
    pub usage_count: i64,
}

pub struct ArtifactCoordinator {
    primary: Arc<dyn Renderer>,
    secondary: Arc<dyn Renderer>,
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn PipelineStore>,
}

impl ArtifactCoordinator {
    pub fn new(
        primary: Arc<dyn Renderer>,
        secondary: Arc<dyn Renderer>,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn PipelineStore>,
    ) -> Self {
        Self {
            primary,
            secondary,
            blobs,
            store,
        }
    }

    pub async fn persist(&self, req: ArtifactRequest<'_>) -> Result<PersistedDocument, AppError> {
        let primary_bytes = self
            .primary
            .render(req.title, req.text, req.fields)
            .await
            .map_err(|e| {
                AppError::Persistence(format!("primary render failed for {}: {e}", req.document_id))
            })?;
        let byte_size = primary_bytes.len() as i64;

        let docx_key = self.key_for(&req, self.primary.as_ref());
        let format = self.primary.format();
        self.blobs
            .put(&docx_key, primary_bytes, format.content_type())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        let pdf_key = match self.store_secondary(&req).await {
            Ok(key) => Some(key),
            Err(reason) => {
                warn!(
                    "Secondary artifact skipped for document {}: {reason}",
                    req.document_id
                );
                None
            }
        };

        let new = NewDocumentRecord {
            id: req.document_id,
            organization_id: req.organization_id,
            created_by: req.actor_id,
            document_type: req.document_type.to_string(),
            title: req.title.to_string(),
            fields: serde_json::Value::Object(req.fields.clone()),
            docx_key: docx_key.clone(),
            pdf_key: pdf_key.clone(),
            byte_size,
            status: DocumentStatus::Generated,
            backend: req.backend.to_string(),
        };

        let limit = req.tier.limit();
        let outcome = self
            .store
            .commit_document(&new, limit)
            .await
            .map_err(|e| {
                warn!(
                    "Record commit failed; orphaned artifacts {docx_key} {}",
                    pdf_key.as_deref().unwrap_or("-")
                );
                AppError::Persistence(format!("record commit failed: {e:#}"))
            })?;

        match outcome {
            CommitOutcome::Committed {
                record,
                usage_count,
            } => {
                info!(
                    "Persisted document {} ({} bytes, pdf: {})",
                    record.id,
                    byte_size,
                    pdf_key.is_some()
                );
                Ok(PersistedDocument {
                    record,
                    usage_count,
                })
            }
            CommitOutcome::QuotaExhausted { usage_count } => {
                warn!(
                    "Quota exhausted before commit; orphaned artifacts {docx_key} {}",
                    pdf_key.as_deref().unwrap_or("-")
                );
                Err(AppError::Entitlement(EntitlementDenial {
                    reason: DenialReason::LimitReached,
                    usage: usage_count,
                    limit,
                    tier: req.tier,
                }))
            }
        }
    }

    async fn store_secondary(&self, req: &ArtifactRequest<'_>) -> Result<String, String> {
        let bytes = self
            .secondary
            .render(req.title, req.text, req.fields)
            .await
            .map_err(|e| e.to_string())?;
        let key = self.key_for(req, self.secondary.as_ref());
        self.blobs
            .put(&key, bytes, self.secondary.format().content_type())
            .await
            .map_err(|e| e.to_string())?;
        Ok(key)
    }

    fn key_for(&self, req: &ArtifactRequest<'_>, renderer: &dyn Renderer) -> String {
        artifact_key(
            req.organization_id,
            req.document_id,
            req.document_type,
            renderer.format().extension(),
        )
    }
}
