use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Display metadata for one document type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
}
