use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of one generation. Transitions are one-way:
/// `draft -> generating -> generated | error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Generating,
    Generated,
    Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid document status transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: DocumentStatus,
    pub to: DocumentStatus,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Generating => "generating",
            DocumentStatus::Generated => "generated",
            DocumentStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Generated | DocumentStatus::Error)
    }

    pub fn transition(self, to: DocumentStatus) -> Result<DocumentStatus, InvalidTransition> {
        use DocumentStatus::*;
        if self.is_terminal() {
            return Err(InvalidTransition { from: self, to });
        }
        match (self, to) {
            (Draft, Generating) | (Generating, Generated) | (Generating, Error) | (Draft, Error) => {
                Ok(to)
            }
            _ => Err(InvalidTransition { from: self, to }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRecordRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub document_type: String,
    pub title: String,
    pub fields: Value,
    pub docx_key: String,
    /// Absent when the secondary (PDF) artifact could not be produced.
    pub pdf_key: Option<String>,
    pub byte_size: i64,
    pub status: String,
    pub backend: String,
    pub created_at: DateTime<Utc>,
}

/// Values for a record insert. Only successful pipeline runs produce one.
#[derive(Debug, Clone)]
pub struct NewDocumentRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub document_type: String,
    pub title: String,
    pub fields: Value,
    pub docx_key: String,
    pub pdf_key: Option<String>,
    pub byte_size: i64,
    pub status: DocumentStatus,
    pub backend: String,
}
