//! Relational store: organizations, template metadata, document records.
//!
//! `commit_document` is the only writer of `usage_count`. It inserts the record and
//! performs a conditional increment in one transaction, so the entitlement limit
//! holds even when requests from the same organization race.

use async_trait::async_trait;
use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::document::{DocumentRecordRow, NewDocumentRecord};
use crate::models::organization::OrganizationRow;
use crate::models::template::TemplateRow;

#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed {
        record: DocumentRecordRow,
        usage_count: i64,
    },
    /// The conditional increment matched no row; nothing was written.
    QuotaExhausted { usage_count: i64 },
}

#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn get_organization(&self, id: Uuid) -> Result<Option<OrganizationRow>>;

    /// Active template metadata for `slug`.
    async fn find_template(&self, slug: &str) -> Result<Option<TemplateRow>>;

    async fn list_templates(&self) -> Result<Vec<TemplateRow>>;

    /// Inserts the record, then increments usage by one if still under `limit`
    /// (negative `limit` means unbounded). Both or neither take effect.
    async fn commit_document(&self, new: &NewDocumentRecord, limit: i64) -> Result<CommitOutcome>;

    async fn get_document(&self, organization_id: Uuid, id: Uuid)
        -> Result<Option<DocumentRecordRow>>;

    /// Newest first.
    async fn list_documents(&self, organization_id: Uuid, limit: i64)
        -> Result<Vec<DocumentRecordRow>>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn get_organization(&self, id: Uuid) -> Result<Option<OrganizationRow>> {
        Ok(sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, tier, subscription_status, usage_count FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_template(&self, slug: &str) -> Result<Option<TemplateRow>> {
        Ok(sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE slug = $1 AND is_active",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_templates(&self) -> Result<Vec<TemplateRow>> {
        Ok(sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE is_active ORDER BY category, title",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn commit_document(&self, new: &NewDocumentRecord, limit: i64) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, DocumentRecordRow>(
            r#"
            INSERT INTO documents
                (id, organization_id, created_by, document_type, title, fields,
                 docx_key, pdf_key, byte_size, status, backend)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.organization_id)
        .bind(new.created_by)
        .bind(&new.document_type)
        .bind(&new.title)
        .bind(&new.fields)
        .bind(&new.docx_key)
        .bind(&new.pdf_key)
        .bind(new.byte_size)
        .bind(new.status.as_str())
        .bind(&new.backend)
        .fetch_one(&mut *tx)
        .await?;

        let usage: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE organizations
            SET usage_count = usage_count + 1
            WHERE id = $1 AND ($2 < 0 OR usage_count < $2)
            RETURNING usage_count
            "#,
        )
        .bind(new.organization_id)
        .bind(limit)
        .fetch_optional(&mut *tx)
        .await?;

        match usage {
            Some(usage_count) => {
                tx.commit().await?;
                info!(
                    "Committed document {} for organization {} (usage now {usage_count})",
                    record.id, new.organization_id
                );
                Ok(CommitOutcome::Committed {
                    record,
                    usage_count,
                })
            }
            None => {
                tx.rollback().await?;
                let usage_count: i64 =
                    sqlx::query_scalar("SELECT usage_count FROM organizations WHERE id = $1")
                        .bind(new.organization_id)
                        .fetch_one(&self.pool)
                        .await?;
                warn!(
                    "Quota exhausted at commit for organization {} (usage {usage_count}, limit {limit})",
                    new.organization_id
                );
                Ok(CommitOutcome::QuotaExhausted { usage_count })
            }
        }
    }

    async fn get_document(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<DocumentRecordRow>> {
        Ok(sqlx::query_as::<_, DocumentRecordRow>(
            "SELECT * FROM documents WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_documents(
        &self,
        organization_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DocumentRecordRow>> {
        Ok(sqlx::query_as::<_, DocumentRecordRow>(
            r#"
            SELECT * FROM documents
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}
