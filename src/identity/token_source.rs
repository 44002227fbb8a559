use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::account::{active_account, Account};
use super::provider::IdentityProvider;
use crate::http::{CredentialInterceptor, RequestDescriptor};

/// Silent token resolution for the active account. Never prompts, never fails upward.
pub struct TokenSource {
    provider: Arc<dyn IdentityProvider>,
    scopes: Vec<String>,
}

impl TokenSource {
    pub fn new(provider: Arc<dyn IdentityProvider>, scopes: Vec<String>) -> Self { Self { provider, scopes } }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> { &self.provider }

    pub fn active_session(&self) -> Option<Account> {
        active_account(&self.provider.accounts()).cloned()
    }

    /// Token for the first cached account, or `None` if there is no session or the provider failed.
    pub async fn token(&self) -> Option<String> {
        let account = self.active_session()?;
        match self.provider.acquire_token_silent(&account, &self.scopes).await {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(target: "adoption_portal::identity", user = %account.username, error = %e, "silent token acquisition failed");
                None
            }
        }
    }
}

#[async_trait]
impl CredentialInterceptor for TokenSource {
    async fn intercept(&self, mut req: RequestDescriptor) -> RequestDescriptor {
        match self.token().await {
            Some(token) => {
                if !req.set_bearer(&token) {
                    warn!(target: "adoption_portal::identity", "token not representable as header; sending unauthenticated");
                }
            }
            None => debug!(target: "adoption_portal::identity", path = %req.path, "no token; request left unmodified"),
        }
        req
    }
}
