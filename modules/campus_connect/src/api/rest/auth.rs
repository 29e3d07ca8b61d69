//! Bearer-token extraction for protected routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use modkit::api::problem::ProblemResponse;

use crate::api::rest::error::map_domain_error;
use crate::contract::model::Caller;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Verified caller of a protected route. Rejects with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Caller);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_string();
        let service = parts
            .extensions
            .get::<Arc<Service>>()
            .cloned()
            .ok_or_else(|| {
                map_domain_error(
                    &DomainError::database("campus_connect service is not mounted"),
                    &instance,
                )
            })?;

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| map_domain_error(&DomainError::InvalidCredential, &instance))?;

        service
            .authenticate(token)
            .map(Authenticated)
            .map_err(|e| map_domain_error(&e, &instance))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(v: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        h
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_ignored() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
