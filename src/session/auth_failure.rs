//! Terminal path for expired sessions: clear cached credentials, tell the user,
//! then sign out after a grace delay and always land on the public entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{DEFAULT_PUBLIC_ENTRY, SIGN_OUT_GRACE};
use crate::error::RequestError;
use crate::identity::IdentityProvider;

pub const SESSION_EXPIRED_NOTICE: &str = "Tu sesión ha expirado. Serás redirigido para iniciar sesión nuevamente.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub trait NoticeSink: Send + Sync {
    fn show(&self, notice: Notice);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Sink that only logs; used when there is no UI attached.
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn show(&self, notice: Notice) {
        warn!(target: "adoption_portal::session", level = ?notice.level, "{}", notice.message);
    }
}

pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, target: &str) {
        info!(target: "adoption_portal::session", %target, "navigate");
    }
}

/// Clears the pending-sign-out flag when dropped.
struct PendingReset(Arc<AtomicBool>);

impl Drop for PendingReset {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

pub struct AuthFailureHandler {
    provider: Arc<dyn IdentityProvider>,
    notices: Arc<dyn NoticeSink>,
    navigator: Arc<dyn Navigator>,
    entry_point: String,
    grace: Duration,
    pending: Arc<AtomicBool>,
}

impl AuthFailureHandler {
    pub fn new(provider: Arc<dyn IdentityProvider>, notices: Arc<dyn NoticeSink>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            provider,
            notices,
            navigator,
            entry_point: DEFAULT_PUBLIC_ENTRY.to_string(),
            grace: SIGN_OUT_GRACE,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_entry_point<S: Into<String>>(mut self, entry: S) -> Self {
        self.entry_point = entry.into();
        self
    }

    /// True while a forced sign-out is scheduled.
    pub fn is_pending(&self) -> bool { self.pending.load(Ordering::Acquire) }

    /// Handle an auth-expiry error. Cache clearing and the notice happen before this returns;
    /// the sign-out runs on a spawned task after the grace delay. Returns `None` for errors
    /// that are not auth expiry, or when a sign-out is already scheduled.
    pub fn handle(&self, err: &RequestError) -> Option<JoinHandle<()>> {
        if !err.is_auth_expired() {
            return None;
        }
        if self.pending.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            info!(target: "adoption_portal::session", "sign-out already scheduled; ignoring repeated auth failure");
            return None;
        }
        warn!(target: "adoption_portal::session", error = %err, grace_ms = self.grace.as_millis() as u64, "session expired");

        self.provider.clear_token_cache();
        self.notices.show(Notice { level: NoticeLevel::Warning, message: SESSION_EXPIRED_NOTICE.to_string() });

        let provider = self.provider.clone();
        let navigator = self.navigator.clone();
        let entry = self.entry_point.clone();
        let grace = self.grace;
        // Moved into the task so an aborted task still releases the flag.
        let pending = PendingReset(self.pending.clone());
        Some(tokio::spawn(async move {
            let _pending = pending;
            tokio::time::sleep(grace).await;
            if let Err(e) = provider.sign_out().await {
                warn!(target: "adoption_portal::session", error = %e, "sign-out failed; redirecting anyway");
            }
            navigator.navigate(&entry);
        }))
    }
}
