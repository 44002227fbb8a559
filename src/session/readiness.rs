//! Aggregates profile and reference-data completion into one "initial load complete" signal.
//!
//! Flags are tracked per session key. Losing the profile, or observing a different session,
//! clears all flags and the emission latch before anything is recomputed.

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use super::verifier::{VerifierPhase, VerifierSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessState {
    pub auth_loaded: bool,
    pub reference_data_loaded: bool,
    pub role_resolved: bool,
}

impl ReadinessState {
    pub fn all_ready(&self) -> bool { self.auth_loaded && self.reference_data_loaded && self.role_resolved }
}

/// What the coordinator needs to know about the reference data loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceStatus {
    pub loading: bool,
    pub len: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Tracker {
    session_key: Option<String>,
    flags: ReadinessState,
    emitted: bool,
}

impl Tracker {
    fn reset(&mut self) {
        *self = Tracker::default();
    }
}

pub struct ReadinessCoordinator {
    tracker: Mutex<Tracker>,
    signal: watch::Sender<bool>,
}

impl Default for ReadinessCoordinator {
    fn default() -> Self { Self::new() }
}

impl ReadinessCoordinator {
    pub fn new() -> Self {
        let (signal, _rx) = watch::channel(false);
        Self { tracker: Mutex::new(Tracker::default()), signal }
    }

    /// Receives `true` once per session when everything has loaded, `false` on reset.
    pub fn subscribe(&self) -> watch::Receiver<bool> { self.signal.subscribe() }

    pub fn state(&self) -> ReadinessState { self.tracker.lock().flags }

    /// The latched signal: true from emission until the next reset.
    pub fn initial_load_complete(&self) -> bool { self.tracker.lock().emitted }

    /// Fold the current loader states in. Returns true only on the call that emits readiness.
    pub fn observe(&self, profile: &VerifierSnapshot, reference: &ReferenceStatus) -> bool {
        let mut t = self.tracker.lock();

        let Some(p) = profile.profile.as_ref() else {
            if t.session_key.is_some() || t.emitted || t.flags != ReadinessState::default() {
                debug!(target: "adoption_portal::session", "no authenticated profile; readiness reset");
                self.reset_locked(&mut t);
            }
            return false;
        };
        if t.session_key.is_some() && t.session_key != profile.session_key {
            debug!(target: "adoption_portal::session", "session changed; readiness reset");
            self.reset_locked(&mut t);
        }
        t.session_key = profile.session_key.clone();

        if !t.flags.auth_loaded && profile.phase == VerifierPhase::Verified && !p.id.is_empty() {
            t.flags.auth_loaded = true;
        }
        if !t.flags.reference_data_loaded && !reference.loading && reference.len > 0 {
            t.flags.reference_data_loaded = true;
        }
        if !t.flags.role_resolved {
            t.flags.role_resolved = true;
        }

        if t.flags.all_ready() && !t.emitted {
            t.emitted = true;
            self.signal.send_replace(true);
            info!(target: "adoption_portal::session", "initial load complete");
            return true;
        }
        false
    }

    /// Page is going away: forget everything for this context.
    pub fn on_unload(&self) {
        let mut t = self.tracker.lock();
        self.reset_locked(&mut t);
    }

    fn reset_locked(&self, t: &mut Tracker) {
        t.reset();
        self.signal.send_if_modified(|v| std::mem::replace(v, false));
    }
}
