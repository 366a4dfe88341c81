//! Bearer token authentication.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use log::debug;

use crate::domain::models::guardian::Guardian;
use crate::domain::DomainError;
use crate::AppState;

/// The guardian behind the `Authorization: Bearer <token>` header.
/// Rejects the request with 401 when the token is missing, unknown or expired.
#[derive(Debug, Clone)]
pub struct AuthenticatedGuardian {
    pub guardian: Guardian,
    pub token: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedGuardian {
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            debug!("Rejected {} {}: no bearer token", parts.method, parts.uri.path());
            DomainError::Unauthorized("Authentication required".to_string())
        })?;

        let guardian = state.identity_service.authenticate(token).await?;
        Ok(Self {
            guardian,
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/children");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc123"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
