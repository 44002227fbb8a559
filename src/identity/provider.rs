use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use super::account::Account;
use crate::error::ProviderError;

/// External identity provider. Owns the account cache and vends short-lived tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Cached accounts for this context, most relevant first.
    fn accounts(&self) -> Vec<Account>;

    /// Token acquisition without user interaction.
    async fn acquire_token_silent(&self, account: &Account, scopes: &[String]) -> Result<String, ProviderError>;

    /// Drop any cached tokens; accounts stay.
    fn clear_token_cache(&self);

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Provider backed by a fixed bearer token, used by the CLI and for local runs against a dev backend.
#[derive(Default)]
pub struct StaticTokenProvider {
    inner: RwLock<Option<(Account, String)>>,
}

impl StaticTokenProvider {
    pub fn signed_in(account: Account, token: String) -> Self {
        Self { inner: RwLock::new(Some((account, token))) }
    }

    pub fn sign_in(&self, account: Account, token: String) {
        info!(target: "adoption_portal::identity", user = %account.username, "static provider sign-in");
        *self.inner.write() = Some((account, token));
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    fn accounts(&self) -> Vec<Account> {
        self.inner.read().as_ref().map(|(a, _)| vec![a.clone()]).unwrap_or_default()
    }

    async fn acquire_token_silent(&self, account: &Account, _scopes: &[String]) -> Result<String, ProviderError> {
        match self.inner.read().as_ref() {
            Some((a, t)) if a.home_account_id == account.home_account_id => Ok(t.clone()),
            Some(_) => Err(ProviderError::InteractionRequired("account not cached".into())),
            None => Err(ProviderError::NoAccount),
        }
    }

    // A static token cannot be refreshed, so there is nothing to drop.
    fn clear_token_cache(&self) {}

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let prev = self.inner.write().take();
        if let Some((a, _)) = prev {
            info!(target: "adoption_portal::identity", user = %a.username, "static provider sign-out");
        }
        Ok(())
    }
}
