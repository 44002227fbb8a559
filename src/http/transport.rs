use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::request::{RawResponse, RequestDescriptor};
use crate::error::RequestError;

/// Performs exactly one network exchange for a prepared request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, req: &RequestDescriptor) -> Result<RawResponse, RequestError>;

    /// Human-readable endpoint description for logs.
    fn ident(&self) -> String;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base: Url) -> Result<Self, RequestError> {
        // Timeouts are enforced by the executor, not by the client.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RequestError::network(e.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn with_client(base: Url, client: reqwest::Client) -> Self { Self { base, client } }

    /// `{base}{path}` by concatenation, so a base carrying a path prefix keeps it.
    pub fn url_for(&self, path: &str) -> Result<Url, RequestError> {
        let base = self.base.as_str().trim_end_matches('/');
        let full = if path.starts_with('/') { format!("{}{}", base, path) } else { format!("{}/{}", base, path) };
        Url::parse(&full).map_err(|e| RequestError::network(format!("invalid url '{}': {}", full, e)))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, req: &RequestDescriptor) -> Result<RawResponse, RequestError> {
        let url = self.url_for(&req.path)?;
        let mut builder = self.client.request(req.method.into(), url).headers(req.headers.clone());
        if let Some(body) = &req.body {
            let bytes = serde_json::to_vec(body).map_err(|e| RequestError::parse(e.to_string()))?;
            builder = builder.body(bytes);
        }
        let resp = builder.send().await.map_err(|e| RequestError::network(e.to_string()))?;
        let status = resp.status();
        let status_text = reason_phrase(&resp);
        let body = resp.text().await.map_err(|e| RequestError::network(e.to_string()))?;
        debug!(target: "adoption_portal::http", status = status.as_u16(), bytes = body.len(), "response received");
        Ok(RawResponse { status: status.as_u16(), status_text, body })
    }

    fn ident(&self) -> String { format!("http:{}", self.base) }
}

/// Reason phrase as sent by the server; hyper only records it when it differs from the canonical one.
fn reason_phrase(resp: &reqwest::Response) -> String {
    resp.extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
        .map(str::to_string)
        .unwrap_or_else(|| resp.status().canonical_reason().unwrap_or("").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_keeps_base_prefix() {
        let t = ReqwestTransport::new(Url::parse("http://localhost:8080/api/").unwrap()).unwrap();
        assert_eq!(t.url_for("/comunas").unwrap().as_str(), "http://localhost:8080/api/comunas");
        assert_eq!(t.url_for("usuarios/perfil/verificar").unwrap().as_str(), "http://localhost:8080/api/usuarios/perfil/verificar");
        assert_eq!(t.ident(), "http:http://localhost:8080/api/");
    }
}
