//! Bearer credentials: HS256 JWTs binding a user id and role.

use std::time::Duration;

use anyhow::{anyhow, bail};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{Caller, Role, User};
use crate::domain::error::DomainError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    iss: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies credentials. Cheap to clone.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
    issuer: String,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration, issuer: impl Into<String>) -> anyhow::Result<Self> {
        if secret.is_empty() {
            bail!("jwt_secret must not be empty");
        }
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| anyhow!("token_ttl is too large"))?;
        if ttl <= chrono::Duration::zero() {
            bail!("token_ttl must be positive");
        }
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            issuer,
        })
    }

    /// Credential for `user` and the instant it stops being accepted.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), DomainError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::database(format!("token encoding failed: {e}")))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);
        Ok((token, expires_at))
    }

    /// Every failure collapses into [`DomainError::InvalidCredential`].
    pub fn verify(&self, token: &str) -> Result<Caller, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "credential rejected");
            DomainError::InvalidCredential
        })?;
        Ok(Caller::new(data.claims.sub, data.claims.role))
    }
}
