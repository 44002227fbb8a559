use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::config::REQUEST_TIMEOUT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One outgoing call. Built per request and dropped when it completes.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl RequestDescriptor {
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self { path: path.into(), method, headers: HeaderMap::new(), body: None, timeout: REQUEST_TIMEOUT }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Caller-supplied header. Invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(n), Ok(v)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.insert(n, v);
        }
        self
    }

    /// Defaults first, caller headers win on conflict.
    pub fn merge_default_headers(&mut self) {
        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in self.headers.iter() {
            merged.insert(name.clone(), value.clone());
        }
        self.headers = merged;
    }

    pub fn set_bearer(&mut self, token: &str) -> bool {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut v) => {
                v.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, v);
                true
            }
            Err(_) => false,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
    }
}

/// Response as read off the wire, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl RawResponse {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self { status, status_text, body: body.into() }
    }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_headers_override_defaults() {
        let mut d = RequestDescriptor::new(Method::Post, "/animales")
            .with_header("content-type", "text/plain")
            .with_header("x-trace", "abc");
        d.merge_default_headers();
        assert_eq!(d.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(d.headers.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn default_content_type_and_bearer() {
        let mut d = RequestDescriptor::new(Method::Get, "/comunas");
        d.merge_default_headers();
        assert_eq!(d.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(d.bearer_token().is_none());
        assert!(d.set_bearer("tok-1"));
        assert_eq!(d.bearer_token(), Some("tok-1"));
        assert_eq!(d.timeout, REQUEST_TIMEOUT);
    }

    #[test]
    fn raw_response_status_text() {
        let r = RawResponse::new(404, "");
        assert_eq!(r.status_text, "Not Found");
        assert!(!r.is_success());
        assert!(RawResponse::new(204, "").is_success());
    }
}
