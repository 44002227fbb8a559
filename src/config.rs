//! Environment-driven configuration for the portal client.

use std::time::Duration;

use reqwest::Url;

use crate::error::{PortalError, PortalResult};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_AUTH_SCOPES: &str = "openid profile email";
pub const DEFAULT_PUBLIC_ENTRY: &str = "/";

/// Hard budget for a single backend call, independent of method.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Delay between the session-expired notice and the forced sign-out.
pub const SIGN_OUT_GRACE: Duration = Duration::from_millis(2_000);

pub const ENV_API_BASE_URL: &str = "PORTAL_API_BASE_URL";
pub const ENV_AUTH_SCOPES: &str = "PORTAL_AUTH_SCOPES";
pub const ENV_PUBLIC_ENTRY: &str = "PORTAL_PUBLIC_ENTRY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub auth_scopes: Vec<String>,
    pub public_entry: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_scopes: split_scopes(DEFAULT_AUTH_SCOPES),
            public_entry: DEFAULT_PUBLIC_ENTRY.to_string(),
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let api_base_url = get(ENV_API_BASE_URL).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let auth_scopes = split_scopes(&get(ENV_AUTH_SCOPES).unwrap_or_else(|| DEFAULT_AUTH_SCOPES.to_string()));
        let public_entry = get(ENV_PUBLIC_ENTRY).unwrap_or_else(|| DEFAULT_PUBLIC_ENTRY.to_string());
        Self { api_base_url, auth_scopes, public_entry }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base: S) -> Self {
        self.api_base_url = base.into();
        self
    }

    /// Parsed base URL; only http(s) is accepted.
    pub fn base_url(&self) -> PortalResult<Url> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| PortalError::Config(format!("invalid {}='{}': {}", ENV_API_BASE_URL, self.api_base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(PortalError::Config(format!("unsupported scheme '{}' in {}", other, ENV_API_BASE_URL))),
        }
    }
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
