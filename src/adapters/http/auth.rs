//! Bearer-token authentication.
//!
//! Tokens are issued by an external provider and signed with a shared HS256
//! secret. The owner id is the `user_id` claim, falling back to `sub`.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use super::error::ApiError;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AuthConfig;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
}

fn claim_as_owner(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Validates bearer tokens and extracts the owner id.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not required
        validation.required_spec_claims = HashSet::new();
        validation.leeway = config.leeway_secs;

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode `token` and return its owner id.
    pub fn verify(&self, token: &str) -> DomainResult<String> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::warn!(error = %e, "JWT validation failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::Unauthorized("Token has expired".to_string()),
                _ => DomainError::Unauthorized("Could not validate credentials".to_string()),
            }
        })?;

        let Claims { user_id, sub } = data.claims;
        claim_as_owner(user_id)
            .or_else(|| claim_as_owner(sub))
            .ok_or_else(|| DomainError::Unauthorized("Token does not identify a user".to_string()))
    }
}

/// The owner proven by the request's bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub String);

impl AuthenticatedOwner {
    /// The `{owner}` path segment must name the token's owner.
    pub fn authorize(&self, path_owner: &str) -> Result<&str, ApiError> {
        if self.0 == path_owner {
            Ok(&self.0)
        } else {
            tracing::warn!(token_owner = %self.0, path_owner, "owner mismatch");
            Err(ApiError(DomainError::Forbidden(
                "Cannot access another user's resources".to_string(),
            )))
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedOwner
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError(DomainError::Unauthorized("Missing bearer token".to_string())))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError(DomainError::Unauthorized("Missing bearer token".to_string())))?;

        let verifier = Arc::<JwtVerifier>::from_ref(state);
        Ok(Self(verifier.verify(token)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "unit-test-secret";

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(&AuthConfig {
            jwt_secret: SECRET.to_string(),
            leeway_secs: 0,
        })
    }

    fn token(claims: &Value, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_user_id_claim_preferred_over_sub() {
        let t = token(&json!({"user_id": "alice", "sub": "other", "exp": now() + 60}), SECRET);
        assert_eq!(verifier().verify(&t).unwrap(), "alice");

        let t = token(&json!({"sub": "bob"}), SECRET);
        assert_eq!(verifier().verify(&t).unwrap(), "bob");
    }

    #[test]
    fn test_rejects_bad_tokens() {
        let cases = [
            token(&json!({"sub": "alice"}), "wrong-secret"),
            token(&json!({"sub": "alice", "exp": now() - 3600}), SECRET),
            token(&json!({"name": "no owner"}), SECRET),
            "not-a-jwt".to_string(),
        ];
        for t in cases {
            assert!(matches!(verifier().verify(&t), Err(DomainError::Unauthorized(_))));
        }
    }

    #[test]
    fn test_authorize_path_owner() {
        let owner = AuthenticatedOwner("alice".to_string());
        assert_eq!(owner.authorize("alice").unwrap(), "alice");
        assert!(matches!(owner.authorize("bob"), Err(ApiError(DomainError::Forbidden(_)))));
    }
}
