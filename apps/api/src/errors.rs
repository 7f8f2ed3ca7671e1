use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::entitlements::EntitlementDenial;
use crate::models::document::InvalidTransition;

/// Message returned for every downstream pipeline failure. Details stay in server logs.
pub const GENERIC_PIPELINE_FAILURE: &str = "Failed to generate document";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document type not found: {0}")]
    TemplateNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Entitlement denied: {}", .0.reason.code())]
    Entitlement(EntitlementDenial),

    /// Text generation or sanitization failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Primary artifact render/upload or record commit failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

/// Store calls return `anyhow::Result`; a wrapped sqlx error keeps its own variant.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<sqlx::Error>() {
            Ok(db) => AppError::Database(db),
            Err(e) => AppError::Internal(e),
        }
    }
}

impl From<InvalidTransition> for AppError {
    fn from(e: InvalidTransition) -> Self {
        AppError::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Entitlement(denial) = &self {
            tracing::info!(
                "Entitlement denied: {} (usage={}, limit={}, tier={})",
                denial.reason.code(),
                denial.usage,
                denial.limit,
                denial.tier
            );
            let message = match denial.reason {
                crate::entitlements::DenialReason::SubscriptionInactive => {
                    "Your subscription is not active"
                }
                crate::entitlements::DenialReason::LimitReached => {
                    "Document generation limit reached for your plan"
                }
            };
            let body = Json(json!({
                "error": {
                    "code": denial.reason.code(),
                    "message": message,
                    "usage": denial.usage,
                    "limit": denial.limit,
                    "tier": denial.tier,
                }
            }));
            return (StatusCode::FORBIDDEN, body).into_response();
        }

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TemplateNotFound(doc_type) => (
                StatusCode::NOT_FOUND,
                "TEMPLATE_NOT_FOUND",
                format!("Unknown document type '{doc_type}'"),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    GENERIC_PIPELINE_FAILURE.to_string(),
                )
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_FAILED",
                    GENERIC_PIPELINE_FAILURE.to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Entitlement(_) => unreachable!("handled above"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
