//! Generation pipeline: guard, compile, generate, sanitize, persist.
//!
//! Every collaborator is injected at startup. `run` is one sequential
//! request-to-response flow with no internal fan-out.

pub mod handlers;
pub mod persistence;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::backends::{BackendRouter, GenerationParams};
use crate::documents::fields::{check_date_order, FieldMap};
use crate::documents::DocumentRegistry;
use crate::entitlements::{self, Decision, SubscriptionStatus, Tier};
use crate::errors::AppError;
use crate::models::document::{DocumentRecordRow, DocumentStatus};
use crate::models::organization::OrganizationRow;
use crate::prompting;
use crate::sanitizer::{sanitize, Draft};
use crate::storage::BlobStore;
use crate::store::PipelineStore;
use persistence::{ArtifactCoordinator, ArtifactRequest};

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub document_type: String,
    #[serde(default)]
    pub fields: FieldMap,
    /// Optional backend hint; unknown ids fall back to priority order.
    #[serde(default)]
    pub backend: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub used: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub generation_id: Uuid,
    pub download_url: String,
    pub pdf_download_url: Option<String>,
    pub document: DocumentRecordRow,
    pub backend: String,
    pub usage: UsageSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub download_ttl: Duration,
}

/// Download references for one record.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadLinks {
    pub download_url: String,
    pub pdf_download_url: Option<String>,
}

pub struct GenerationPipeline {
    registry: Arc<DocumentRegistry>,
    router: Arc<BackendRouter>,
    coordinator: ArtifactCoordinator,
    store: Arc<dyn PipelineStore>,
    blobs: Arc<dyn BlobStore>,
    settings: GenerationSettings,
}

impl GenerationPipeline {
    pub fn new(
        registry: Arc<DocumentRegistry>,
        router: Arc<BackendRouter>,
        coordinator: ArtifactCoordinator,
        store: Arc<dyn PipelineStore>,
        blobs: Arc<dyn BlobStore>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            registry,
            router,
            coordinator,
            store,
            blobs,
            settings,
        }
    }

    pub async fn run(
        &self,
        auth: AuthContext,
        request: GenerateRequest,
        today: NaiveDate,
    ) -> Result<GenerationOutcome, AppError> {
        let GenerateRequest {
            document_type,
            fields,
            backend,
        } = request;

        // 1. Entitlement gate
        let org = self
            .store
            .get_organization(auth.organization_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let (tier, status) = entitlement_of(&org)?;
        if let Decision::Deny(denial) = entitlements::check(tier, status, org.usage_count) {
            warn!(
                "Generation denied for organization {}: {}",
                org.id,
                denial.reason.code()
            );
            return Err(AppError::Entitlement(denial));
        }

        // 2. Template lookup and defensive field checks
        let template = self
            .store
            .find_template(&document_type)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound(document_type.clone()))?;
        check_date_order(&fields).map_err(|errors| AppError::Validation(errors.join("; ")))?;

        let document_id = Uuid::new_v4();
        let mut lifecycle = DocumentStatus::Draft.transition(DocumentStatus::Generating)?;
        // 3. Compile, generate, sanitize
        let kind = self.registry.resolve(&document_type);
        if !self.registry.is_registered(&document_type) {
            info!("No builder registered for '{document_type}'; using the generic prompt");
        }
        info!(
            "Generating {} ({document_type}) document {document_id} for organization {}",
            kind.title, org.id
        );
        let prompt = prompting::compile(&self.registry, &document_type, &fields, today);
        let params = GenerationParams {
            system: &prompt.system,
            user: &prompt.user,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };
        let routed = self.router.generate(backend.as_deref(), &params).await;

        let draft = sanitize(
            Draft::from_generated(routed.text, &kind.signatures),
            &kind.signatures,
            &fields,
            today,
        );
        if draft.text.trim().is_empty() {
            lifecycle = lifecycle.transition(DocumentStatus::Error)?;
            error!("Document {document_id} is {} after sanitize: empty text", lifecycle.as_str());
            return Err(AppError::Generation(format!(
                "sanitized text for {document_id} is empty (backend {})",
                routed.backend
            )));
        }

        // 4. Render, store, record, count
        let persisted = self
            .coordinator
            .persist(ArtifactRequest {
                document_id,
                organization_id: org.id,
                actor_id: auth.actor_id,
                document_type: &document_type,
                title: &template.title,
                text: &draft.text,
                fields: &fields,
                backend: &routed.backend,
                tier,
            })
            .await;
        let persisted = match persisted {
            Ok(p) => p,
            Err(e) => {
                let lifecycle = lifecycle.transition(DocumentStatus::Error)?;
                error!("Document {document_id} is {}: {e}", lifecycle.as_str());
                return Err(e);
            }
        };
        lifecycle.transition(DocumentStatus::Generated)?;

        let links = self.download_links(&persisted.record).await?;
        info!(
            "Generated document {document_id} via '{}' after {} attempt(s) ({} bytes)",
            routed.backend,
            routed.attempts.len(),
            persisted.record.byte_size
        );

        Ok(GenerationOutcome {
            generation_id: document_id,
            download_url: links.download_url,
            pdf_download_url: links.pdf_download_url,
            document: persisted.record,
            backend: routed.backend,
            usage: UsageSummary {
                used: persisted.usage_count,
                limit: tier.limit(),
            },
        })
    }

    /// Issues fresh time-limited references. A PDF presign failure only drops that link.
    pub async fn download_links(&self, record: &DocumentRecordRow) -> Result<DownloadLinks, AppError> {
        let ttl = self.settings.download_ttl;
        let download_url = self
            .blobs
            .presign_get(&record.docx_key, ttl)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        let pdf_download_url = match &record.pdf_key {
            Some(key) => match self.blobs.presign_get(key, ttl).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("PDF link unavailable for document {}: {e}", record.id);
                    None
                }
            },
            None => None,
        };

        Ok(DownloadLinks {
            download_url,
            pdf_download_url,
        })
    }
}

/// Parses the organization's tier and status columns.
pub fn entitlement_of(org: &OrganizationRow) -> Result<(Tier, SubscriptionStatus), AppError> {
    let tier = org.tier().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "organization {} has unknown tier '{}'",
            org.id,
            org.tier
        ))
    })?;
    let status = org.status().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "organization {} has unknown subscription status '{}'",
            org.id,
            org.subscription_status
        ))
    })?;
    Ok((tier, status))
}


#[cfg(test)]
mod tests {
    use super::testing::{rig, RigOptions};
    use super::*;
    use crate::entitlements::DenialReason;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn request(document_type: &str, fields: serde_json::Value) -> GenerateRequest {
        GenerateRequest {
            document_type: document_type.to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
            backend: None,
        }
    }

    fn petition() -> GenerateRequest {
        request(
            "divorce_petition",
            json!({
                "petitioner_name": "Jane Doe",
                "respondent_name": "John Roe",
                "marriage_date": "2015-06-01",
                "separation_date": "2024-01-15"
            }),
        )
    }

    #[tokio::test]
    async fn test_successful_run_persists_and_counts_once() {
        let r = rig(RigOptions::default());
        let out = r.pipeline.run(r.auth(), petition(), today()).await.unwrap();

        assert_eq!(out.backend, "local");
        assert_eq!(out.usage.used, 1);
        assert_eq!(out.usage.limit, 10);
        assert_eq!(r.store.usage(r.org), 1);
        assert_eq!(r.store.commits(), 1);
        assert_eq!(out.document.id, out.generation_id);
        assert_eq!(out.document.title, "Petition for Dissolution of Marriage");
        assert!(out.download_url.contains(".docx"));
        assert!(out.pdf_download_url.unwrap().contains(".pdf"));
        assert_eq!(r.blobs.keys().len(), 2);
    }

    #[tokio::test]
    async fn test_stored_text_is_sanitized_with_signature() {
        let r = rig(RigOptions::default());
        let out = r.pipeline.run(r.auth(), petition(), today()).await.unwrap();
        let objects = r.blobs.objects.lock().unwrap();
        let (bytes, _) = &objects[&out.document.docx_key];
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("=== BEGIN DOCUMENT ==="));
        assert!(!text.contains('['));
        assert!(text.contains("JANE DOE"));
    }

    #[tokio::test]
    async fn test_trial_at_limit_is_denied_with_quota_payload() {
        let r = rig(RigOptions {
            tier: "trial",
            usage: 3,
            ..Default::default()
        });
        let err = r.pipeline.run(r.auth(), petition(), today()).await.unwrap_err();
        match err {
            AppError::Entitlement(d) => {
                assert_eq!(d.reason, DenialReason::LimitReached);
                assert_eq!((d.usage, d.limit, d.tier), (3, 3, Tier::Trial));
            }
            other => panic!("expected LIMIT_REACHED, got {other:?}"),
        }
        assert_eq!(r.store.commits(), 0);
        assert!(r.blobs.keys().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_subscription_denied_before_usage() {
        let r = rig(RigOptions {
            tier: "pro",
            status: "past_due",
            ..Default::default()
        });
        let err = r.pipeline.run(r.auth(), petition(), today()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Entitlement(ref d) if d.reason == DenialReason::SubscriptionInactive
        ));
    }

    #[tokio::test]
    async fn test_unknown_organization_is_unauthorized() {
        let r = rig(RigOptions::default());
        let auth = AuthContext {
            actor_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
        };
        let err = r.pipeline.run(auth, petition(), today()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let r = rig(RigOptions::default());
        let err = r
            .pipeline
            .run(r.auth(), request("eviction_notice", json!({})), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TemplateNotFound(ref t) if t == "eviction_notice"));
        assert_eq!(r.store.usage(r.org), 0);
    }

    #[tokio::test]
    async fn test_separation_before_marriage_is_rejected() {
        let r = rig(RigOptions::default());
        let req = request(
            "divorce_petition",
            json!({"marriage_date": "2020-01-01", "separation_date": "2019-01-01"}),
        );
        let err = r.pipeline.run(r.auth(), req, today()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(r.store.commits(), 0);
    }

    #[tokio::test]
    async fn test_pdf_failure_still_succeeds_without_pdf_reference() {
        let r = rig(RigOptions {
            pdf_fails: true,
            ..Default::default()
        });
        let out = r.pipeline.run(r.auth(), petition(), today()).await.unwrap();
        assert!(out.document.pdf_key.is_none());
        assert!(out.pdf_download_url.is_none());
        assert!(!out.download_url.is_empty());
        assert_eq!(r.store.usage(r.org), 1);
    }

    #[tokio::test]
    async fn test_unregistered_type_with_template_uses_generic_builder() {
        let r = rig(RigOptions::default());
        let req = request(
            "name_change_petition",
            json!({"petitioner_name": "Jane Doe", "new_name": "Jane Smith"}),
        );
        let out = r.pipeline.run(r.auth(), req, today()).await.unwrap();
        assert_eq!(out.document.document_type, "name_change_petition");
        assert!(out.document.docx_key.ends_with("name_change_petition.docx"));
    }

    #[tokio::test]
    async fn test_custody_document_carries_both_signers() {
        let r = rig(RigOptions::default());
        let req = request(
            "custody_agreement",
            json!({"petitioner_name": "Jane Doe", "respondent_name": "John Roe"}),
        );
        let out = r.pipeline.run(r.auth(), req, today()).await.unwrap();
        let objects = r.blobs.objects.lock().unwrap();
        let text = String::from_utf8(objects[&out.document.docx_key].0.to_vec()).unwrap();
        assert!(text.contains("JANE DOE\nPetitioner"));
        assert!(text.contains("JOHN ROE\nRespondent"));
    }
}
