//! Error model for the request layer and startup coordination.
//! `RequestError` is the classified per-request failure surfaced to callers of the
//! executor; `ProviderError` stays on the identity side; `PortalError` is the crate error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Messages the backend or provider use to signal an expired or invalid session.
static SESSION_EXPIRED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\b401\b|\b403\b|unauthori[sz]ed|forbidden|token\s+(has\s+)?expired|session\s+(has\s+)?expired|sesi[oó]n\s+(ha\s+)?expirad[ao]|no\s+autorizado|login_required|interaction_required)",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestError {
    /// Connection-level failure: DNS, refused, reset, unreadable body.
    #[error("network error: {message}")]
    Network { message: String },
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("HTTP error {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },
    #[error("session expired: {message}")]
    AuthExpired { status: Option<u16>, message: String },
    #[error("invalid JSON response: {message}")]
    Parse { message: String },
}

impl RequestError {
    pub fn network<S: Into<String>>(msg: S) -> Self { RequestError::Network { message: msg.into() } }
    pub fn parse<S: Into<String>>(msg: S) -> Self { RequestError::Parse { message: msg.into() } }

    pub fn code_str(&self) -> &'static str {
        match self {
            RequestError::Network { .. } => "network_error",
            RequestError::Timeout { .. } => "timeout_error",
            RequestError::HttpStatus { .. } => "http_status_error",
            RequestError::AuthExpired { .. } => "auth_expired",
            RequestError::Parse { .. } => "parse_error",
        }
    }

    /// Original HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::HttpStatus { status, .. } => Some(*status),
            RequestError::AuthExpired { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool { matches!(self, RequestError::AuthExpired { .. }) }

    /// Caller-level reclassification: 401/403 responses and errors whose message
    /// reads like a session expiry become `AuthExpired`. Everything else is unchanged.
    pub fn classify_auth(self) -> Self {
        match self {
            RequestError::HttpStatus { status, status_text } if status == 401 || status == 403 => {
                RequestError::AuthExpired { status: Some(status), message: status_text }
            }
            RequestError::HttpStatus { status, status_text } if SESSION_EXPIRED_RE.is_match(&status_text) => {
                RequestError::AuthExpired { status: Some(status), message: status_text }
            }
            RequestError::Network { message } if SESSION_EXPIRED_RE.is_match(&message) => {
                RequestError::AuthExpired { status: None, message }
            }
            other => other,
        }
    }
}

/// Failures reported by the identity provider. These never reach the executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no signed-in account")]
    NoAccount,
    #[error("interactive sign-in required: {0}")]
    InteractionRequired(String),
    #[error("identity provider failure: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid profile: {0}")]
    Profile(String),
}

pub type PortalResult<T> = Result<T, PortalError>;

/// Matches free text against the session-expiry vocabulary.
pub fn looks_like_session_expiry(text: &str) -> bool { SESSION_EXPIRED_RE.is_match(text) }
