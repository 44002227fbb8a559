//! Request executor: header merge, credential stamping, hard timeout, response normalization.
//!
//! Every call is exactly one transport attempt. Failures are always returned to the caller;
//! auth-expiry classification is the caller's job (`RequestError::classify_auth`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::request::{Method, RawResponse, RequestDescriptor};
use super::transport::HttpTransport;
use crate::config::REQUEST_TIMEOUT;
use crate::error::RequestError;

/// Stamps credentials onto an outgoing request. Must not fail: when no credential is
/// available the request is returned unmodified.
#[async_trait]
pub trait CredentialInterceptor: Send + Sync {
    async fn intercept(&self, req: RequestDescriptor) -> RequestDescriptor;
}

/// Pass-through interceptor for unauthenticated calls.
pub struct Anonymous;

#[async_trait]
impl CredentialInterceptor for Anonymous {
    async fn intercept(&self, req: RequestDescriptor) -> RequestDescriptor { req }
}

pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    interceptor: Arc<dyn CredentialInterceptor>,
    timeout: Duration,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, interceptor: Arc<dyn CredentialInterceptor>) -> Self {
        Self { transport, interceptor, timeout: REQUEST_TIMEOUT }
    }

    pub fn timeout(&self) -> Duration { self.timeout }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.request(RequestDescriptor::new(Method::Get, path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(with_json_body(RequestDescriptor::new(Method::Post, path), body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(with_json_body(RequestDescriptor::new(Method::Put, path), body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.request(RequestDescriptor::new(Method::Delete, path)).await
    }

    /// Typed variant of [`execute`](Self::execute). An empty success decodes from `{}`,
    /// or from `null` for targets like `()` and `Option<T>`.
    pub async fn request<T: DeserializeOwned>(&self, req: RequestDescriptor) -> Result<T, RequestError> {
        let value = self.execute(req).await?;
        if value == empty_success() {
            if let Ok(v) = T::deserialize(&value) {
                return Ok(v);
            }
            return T::deserialize(Value::Null).map_err(|e| RequestError::parse(e.to_string()));
        }
        serde_json::from_value(value).map_err(|e| RequestError::parse(e.to_string()))
    }

    /// Run one call. Empty and 204 bodies resolve to an empty JSON object.
    pub async fn execute(&self, mut req: RequestDescriptor) -> Result<Value, RequestError> {
        let request_id = Uuid::new_v4();
        req.merge_default_headers();
        req.timeout = self.timeout;
        let req = self.interceptor.intercept(req).await;
        debug!(
            target: "adoption_portal::http",
            %request_id,
            method = req.method.as_str(),
            path = %req.path,
            authenticated = req.bearer_token().is_some(),
            "request start"
        );

        let raw = match tokio::time::timeout(self.timeout, self.transport.send(&req)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(target: "adoption_portal::http", %request_id, path = %req.path, error = %e, "request failed");
                return Err(e);
            }
            Err(_) => {
                let e = RequestError::Timeout { timeout_ms: self.timeout.as_millis() as u64 };
                warn!(target: "adoption_portal::http", %request_id, path = %req.path, error = %e, "request aborted");
                return Err(e);
            }
        };

        let out = normalize(raw);
        if let Err(e) = &out {
            warn!(target: "adoption_portal::http", %request_id, path = %req.path, error = %e, "request failed");
        }
        out
    }
}

fn with_json_body<B: Serialize + ?Sized>(req: RequestDescriptor, body: Option<&B>) -> Result<RequestDescriptor, RequestError> {
    match body {
        Some(b) => {
            let v = serde_json::to_value(b).map_err(|e| RequestError::parse(e.to_string()))?;
            Ok(req.with_body(v))
        }
        None => Ok(req),
    }
}

fn empty_success() -> Value { Value::Object(Map::new()) }

/// Status check first (failed bodies are never parsed), then 204, then body text.
pub(crate) fn normalize(raw: RawResponse) -> Result<Value, RequestError> {
    if !raw.is_success() {
        return Err(RequestError::HttpStatus { status: raw.status, status_text: raw.status_text });
    }
    if raw.status == 204 {
        return Ok(empty_success());
    }
    if raw.body.trim().is_empty() {
        return Ok(empty_success());
    }
    serde_json::from_str(&raw.body).map_err(|e| RequestError::parse(e.to_string()))
}
