//! Backend profile verification for the active session.
//!
//! Phases: Idle -> Verifying -> {Verified | Failed | Unauthenticated}. A single atomic flag
//! keeps one verification in flight; a generation counter discards responses that belong
//! to a session that has since gone away or been reloaded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::auth_failure::AuthFailureHandler;
use super::store::{ProfileRecord, ProfileStore};
use crate::error::RequestError;
use crate::http::RequestExecutor;
use crate::identity::{Account, AuthenticatedProfile};

pub const PROFILE_VERIFY_PATH: &str = "/usuarios/perfil/verificar";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierPhase {
    Idle,
    Verifying,
    Verified,
    Failed,
    Unauthenticated,
}

/// Point-in-time view of the verifier, as consumed by the readiness coordinator and UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifierSnapshot {
    pub phase: VerifierPhase,
    pub session_key: Option<String>,
    pub profile: Option<AuthenticatedProfile>,
    pub is_collaborator: bool,
    pub error: Option<String>,
}

impl VerifierSnapshot {
    pub fn loading(&self) -> bool { self.phase == VerifierPhase::Verifying }
}

#[derive(Debug)]
pub enum VerifyOutcome {
    /// Fresh profile from the backend.
    Verified(ProfileRecord),
    /// Profile already held for this session; no backend call.
    Cached(ProfileRecord),
    /// Another verification for this session is running.
    InFlight,
    /// Session changed or a reload started while this call was waiting.
    Superseded,
    Unauthenticated,
    /// Handed to the auth-failure handler.
    AuthExpired(RequestError),
    /// Recorded locally; retry with `verify` or `reload`.
    Failed(RequestError),
}

#[derive(Debug)]
struct VerifierState {
    phase: VerifierPhase,
    session_key: Option<String>,
    error: Option<String>,
}

pub struct ProfileVerifier {
    executor: Arc<RequestExecutor>,
    store: Arc<ProfileStore>,
    auth_failure: Arc<AuthFailureHandler>,
    in_flight: AtomicBool,
    generation: AtomicU64,
    state: RwLock<VerifierState>,
}

/// Releases the in-flight flag unless a newer verification has taken it over.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    generation: &'a AtomicU64,
    owned_at: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.generation.load(Ordering::SeqCst) == self.owned_at {
            self.flag.store(false, Ordering::Release);
        }
    }
}

impl ProfileVerifier {
    pub fn new(executor: Arc<RequestExecutor>, store: Arc<ProfileStore>, auth_failure: Arc<AuthFailureHandler>) -> Self {
        Self {
            executor,
            store,
            auth_failure,
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            state: RwLock::new(VerifierState { phase: VerifierPhase::Idle, session_key: None, error: None }),
        }
    }

    pub fn store(&self) -> &Arc<ProfileStore> { &self.store }

    pub fn snapshot(&self) -> VerifierSnapshot {
        let st = self.state.read();
        let record = self
            .store
            .current()
            .filter(|r| st.session_key.as_deref() == Some(r.session_key.as_str()));
        VerifierSnapshot {
            phase: st.phase,
            session_key: st.session_key.clone(),
            is_collaborator: record.as_ref().map(|r| r.is_collaborator).unwrap_or(false),
            profile: record.map(|r| r.profile),
            error: st.error.clone(),
        }
    }

    pub fn is_collaborator(&self) -> bool { self.store.is_collaborator() }

    /// Verify the given session, adopting a cached profile when one exists for it.
    pub async fn verify(&self, session: Option<&Account>) -> VerifyOutcome {
        self.run(session, false).await
    }

    /// Re-verify against the backend even if a profile is cached, e.g. after a role change.
    pub async fn reload(&self, session: Option<&Account>) -> VerifyOutcome {
        {
            let _st = self.state.write();
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.in_flight.store(false, Ordering::Release);
        }
        self.run(session, true).await
    }

    async fn run(&self, session: Option<&Account>, force: bool) -> VerifyOutcome {
        let Some(account) = session else {
            self.sign_out_transition();
            return VerifyOutcome::Unauthenticated;
        };
        let key = account.session_key().to_string();

        if !force {
            if let Some(profile) = self.store.cached_for(&key) {
                let mut st = self.state.write();
                if st.session_key.as_deref() != Some(key.as_str()) {
                    // A run still pending for another account must not publish over this one.
                    self.generation.fetch_add(1, Ordering::SeqCst);
                    self.in_flight.store(false, Ordering::Release);
                }
                let record = self.store.publish(&key, profile);
                *st = VerifierState { phase: VerifierPhase::Verified, session_key: Some(key), error: None };
                debug!(target: "adoption_portal::session", collaborator = record.is_collaborator, "adopted cached profile");
                return VerifyOutcome::Cached(record);
            }
        }

        let owned_at = {
            let mut st = self.state.write();
            if self.in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
                if st.session_key.as_deref() == Some(key.as_str()) {
                    debug!(target: "adoption_portal::session", "verification already in flight");
                    return VerifyOutcome::InFlight;
                }
                // A different account appeared while the previous one was verifying.
                self.generation.fetch_add(1, Ordering::SeqCst);
            }
            *st = VerifierState { phase: VerifierPhase::Verifying, session_key: Some(key.clone()), error: None };
            self.generation.load(Ordering::SeqCst)
        };
        let _guard = InFlightGuard { flag: &self.in_flight, generation: &self.generation, owned_at };

        info!(target: "adoption_portal::session", user = %account.username, "verifying profile");
        let body = json!({ "email": account.username, "nombre": account.name });
        let result = self
            .executor
            .post::<Value, _>(PROFILE_VERIFY_PATH, Some(&body))
            .await
            .and_then(|v| AuthenticatedProfile::from_backend(v).map_err(|e| RequestError::parse(e.to_string())));

        let mut st = self.state.write();
        if self.generation.load(Ordering::SeqCst) != owned_at {
            debug!(target: "adoption_portal::session", "discarding superseded verification result");
            return VerifyOutcome::Superseded;
        }
        match result {
            Ok(profile) => {
                let record = self.store.publish(&key, profile);
                *st = VerifierState { phase: VerifierPhase::Verified, session_key: Some(key), error: None };
                info!(
                    target: "adoption_portal::session",
                    user_id = %record.profile.id,
                    role = %record.profile.role,
                    collaborator = record.is_collaborator,
                    "profile verified"
                );
                VerifyOutcome::Verified(record)
            }
            Err(e) => {
                let e = e.classify_auth();
                self.store.clear();
                if e.is_auth_expired() {
                    *st = VerifierState { phase: VerifierPhase::Unauthenticated, session_key: None, error: None };
                    drop(st);
                    self.auth_failure.handle(&e);
                    VerifyOutcome::AuthExpired(e)
                } else {
                    warn!(target: "adoption_portal::session", error = %e, "profile verification failed");
                    *st = VerifierState { phase: VerifierPhase::Failed, session_key: Some(key), error: Some(e.to_string()) };
                    VerifyOutcome::Failed(e)
                }
            }
        }
    }

    /// No session: drop the profile and make any pending verification stale.
    fn sign_out_transition(&self) {
        let mut st = self.state.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::Release);
        self.store.clear();
        *st = VerifierState { phase: VerifierPhase::Unauthenticated, session_key: None, error: None };
    }
}
