//! Bearer token verification into an `ActorContext`

use super::error::{map_domain_error, Problem};
use crate::config::JwtConfig;
use crate::contract::{ActorContext, Role, WorkflowError};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims carried by workflow tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Older tokens put the user id here instead of `sub`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub exp: u64,
}

/// HS256 verifier built from module configuration
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Decode and check a token, then build the caller's identity from its claims
    pub fn verify(&self, token: &str) -> Result<ActorContext, WorkflowError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            WorkflowError::Unauthorized {
                reason: format!("invalid token: {}", e),
            }
        })?;
        actor_from_claims(data.claims)
    }
}

fn actor_from_claims(claims: Claims) -> Result<ActorContext, WorkflowError> {
    let user_id = claims
        .sub
        .or(claims.id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| WorkflowError::Unauthorized {
            reason: "token carries no user id".to_string(),
        })?;
    let role = Role::parse(&claims.role).ok_or_else(|| WorkflowError::Unauthorized {
        reason: format!("unknown role '{}'", claims.role),
    })?;

    let mut actor = ActorContext::new(user_id, role);
    actor.email = claims.email;
    actor.name = claims.name;
    actor.department = claims.department;
    actor.country = claims.country;
    Ok(actor)
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct Actor(pub ActorContext);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let verifier = parts
            .extensions
            .get::<Arc<JwtVerifier>>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("JwtVerifier extension is not installed on the router");
                Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            })?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                map_domain_error(WorkflowError::Unauthorized {
                    reason: "missing bearer token".to_string(),
                })
            })?;

        verifier.verify(token).map(Actor).map_err(map_domain_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-secret".to_string(),
            leeway_seconds: 0,
            issuer: None,
        }
    }

    fn token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(role: &str) -> Claims {
        Claims {
            sub: Some("u-1".to_string()),
            id: None,
            role: role.to_string(),
            email: Some("owner@example.com".to_string()),
            name: None,
            department: Some("Finance".to_string()),
            country: None,
            exp: (chrono::Utc::now().timestamp() + 600) as u64,
        }
    }

    #[test]
    fn test_valid_token_yields_actor() {
        let verifier = JwtVerifier::new(&config());
        let actor = verifier
            .verify(&token(&claims("document_owner"), "unit-secret"))
            .unwrap();
        assert_eq!(actor.user_id, "u-1");
        assert_eq!(actor.role, Role::DocumentOwner);
        assert_eq!(actor.department.as_deref(), Some("Finance"));
    }

    #[test]
    fn test_legacy_id_claim_is_accepted() {
        let verifier = JwtVerifier::new(&config());
        let mut c = claims("admin");
        c.sub = None;
        c.id = Some("legacy-7".to_string());
        let actor = verifier.verify(&token(&c, "unit-secret")).unwrap();
        assert_eq!(actor.user_id, "legacy-7");
    }

    #[test]
    fn test_wrong_secret_and_expiry_are_unauthorized() {
        let verifier = JwtVerifier::new(&config());
        let err = verifier
            .verify(&token(&claims("admin"), "other-secret"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));

        let mut expired = claims("admin");
        expired.exp = (chrono::Utc::now().timestamp() - 3600) as u64;
        let err = verifier.verify(&token(&expired, "unit-secret")).unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }

    #[test]
    fn test_unknown_role_is_unauthorized() {
        let verifier = JwtVerifier::new(&config());
        let err = verifier
            .verify(&token(&claims("janitor"), "unit-secret"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }
}
