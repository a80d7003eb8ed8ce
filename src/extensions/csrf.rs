//! Cross-site request forgery protection.
//!
//! Tokens are `"<nonce>.<issued unix seconds>.<signature>"` and stay valid
//! for [`DEFAULT_TIME_LIMIT`]. Unsafe methods must echo a valid token in
//! the `X-CSRFToken` header.

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use super::signing;
use crate::config::SecretKey;

/// Request header carrying the token.
pub const CSRF_HEADER: &str = "x-csrftoken";
/// How long an issued token is accepted.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(3600);

const PURPOSE: &str = "csrf";
const NONCE_LEN: usize = 16;

/// Reasons a request fails the CSRF check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsrfError {
    #[error("The CSRF token is missing.")]
    Missing,
    #[error("The CSRF token is malformed.")]
    Malformed,
    #[error("The CSRF token is invalid.")]
    Invalid,
    #[error("The CSRF token has expired.")]
    Expired,
}

/// CSRF guard shared by the router middleware.
#[derive(Clone)]
pub struct CsrfProtect {
    key: Arc<[u8]>,
    enabled: bool,
    time_limit: Duration,
}

impl CsrfProtect {
    pub fn new(secret: &SecretKey, enabled: bool) -> Self {
        Self {
            key: Arc::from(secret.as_bytes()),
            enabled,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Issues a token valid from now.
    pub fn generate_token(&self) -> String {
        self.token_issued_at(Utc::now().timestamp())
    }

    pub(super) fn token_issued_at(&self, issued: i64) -> String {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);
        let payload = format!("{}.{}", hex::encode(nonce), issued);
        let signature = signing::sign(&self.key, PURPOSE, &payload);
        format!("{}.{}", payload, signature)
    }

    /// Checks signature and age of `token`.
    pub fn validate(&self, token: &str) -> Result<(), CsrfError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(CsrfError::Malformed)?;
        let (_, issued) = payload.split_once('.').ok_or(CsrfError::Malformed)?;
        let issued: i64 = issued.parse().map_err(|_| CsrfError::Malformed)?;

        if !signing::verify(&self.key, PURPOSE, payload, signature) {
            return Err(CsrfError::Invalid);
        }

        let age = Utc::now().timestamp().saturating_sub(issued);
        if age < 0 {
            return Err(CsrfError::Invalid);
        }
        if age as u64 > self.time_limit.as_secs() {
            return Err(CsrfError::Expired);
        }

        Ok(())
    }

    /// True when requests with `method` must carry a token.
    pub fn requires_check(&self, method: &Method) -> bool {
        self.enabled && !method.is_safe()
    }

    /// Validates an optional header value.
    pub fn check(&self, token: Option<&str>) -> Result<(), CsrfError> {
        match token {
            Some(token) if !token.is_empty() => self.validate(token),
            _ => Err(CsrfError::Missing),
        }
    }
}

/// Middleware rejecting unsafe requests without a valid token.
pub async fn protect(State(csrf): State<CsrfProtect>, req: Request, next: Next) -> Response {
    if csrf.requires_check(req.method()) {
        let token = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok());

        if let Err(e) = csrf.check(token) {
            warn!(method = %req.method(), path = %req.uri().path(), error = %e, "CSRF check failed");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    }

    next.run(req).await
}
