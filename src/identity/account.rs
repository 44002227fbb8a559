use serde::{Deserialize, Serialize};

/// One cached identity-provider account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub home_account_id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Account {
    pub fn new<S: Into<String>>(home_account_id: S, username: S) -> Self {
        Self { home_account_id: home_account_id.into(), username: username.into(), name: None }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Key used to scope per-session state.
    pub fn session_key(&self) -> &str { &self.home_account_id }
}

/// The active session is the first cached account, if any.
pub fn active_account(pool: &[Account]) -> Option<&Account> { pool.first() }
