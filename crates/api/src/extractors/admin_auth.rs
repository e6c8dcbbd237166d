//! Admin bearer-token authentication.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::jwt::{JwtConfig, JwtError};

/// The authenticated administrator of the current request.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub user: User,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

pub fn jwt_config(state: &AppState) -> Result<JwtConfig, ApiError> {
    let jwt = &state.config.jwt;
    JwtConfig::from_rsa_pem(
        &jwt.private_key,
        &jwt.public_key,
        jwt.access_token_expiry_secs,
        jwt.leeway_secs,
    )
    .map_err(|e| ApiError::Internal(format!("Failed to initialize JWT config: {}", e)))
}

impl AdminAuth {
    /// Validates the bearer token and loads its user, who must be an active
    /// administrator.
    pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = bearer_token(headers)?;
        let claims = jwt_config(state)?
            .validate_token(token)
            .map_err(|e| match e {
                JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
                _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
            })?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        let user: User = UserRepository::new(state.pool.clone())
            .find_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        if !user.admin || !user.is_active() {
            tracing::warn!(user_id = %user.id, "Non-admin access to admin surface refused");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(Self { user })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already authenticated by the admin route layer.
        if let Some(auth) = parts.extensions.get::<AdminAuth>() {
            return Ok(auth.clone());
        }
        Self::authenticate(state, &parts.headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
