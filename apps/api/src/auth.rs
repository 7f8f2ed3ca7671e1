//! Identity context supplied by the upstream session gateway.
//!
//! The gateway authenticates the caller and forwards the actor and organization as
//! headers. Anything missing or malformed is treated as unauthenticated.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub actor_id: Uuid,
    pub organization_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header_uuid(parts, ACTOR_HEADER).ok_or(AppError::Unauthorized)?;
        let organization_id =
            header_uuid(parts, ORGANIZATION_HEADER).ok_or(AppError::Unauthorized)?;
        Ok(AuthContext {
            actor_id,
            organization_id,
        })
    }
}

fn header_uuid(parts: &Parts, name: &str) -> Option<Uuid> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthContext, AppError> {
        let (mut parts, _) = request.into_parts();
        AuthContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_actor_and_organization() {
        let actor = Uuid::new_v4();
        let org = Uuid::new_v4();
        let request = Request::builder()
            .header(ACTOR_HEADER, actor.to_string())
            .header(ORGANIZATION_HEADER, org.to_string())
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.actor_id, actor);
        assert_eq!(ctx.organization_id, org);
    }

    #[tokio::test]
    async fn test_missing_organization_is_unauthorized() {
        let request = Request::builder()
            .header(ACTOR_HEADER, Uuid::new_v4().to_string())
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_malformed_actor_is_unauthorized() {
        let request = Request::builder()
            .header(ACTOR_HEADER, "not-a-uuid")
            .header(ORGANIZATION_HEADER, Uuid::new_v4().to_string())
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Unauthorized)));
    }
}
