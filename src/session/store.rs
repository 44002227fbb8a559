use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::identity::{is_collaborator, AuthenticatedProfile};

/// Profile published for one session, with the privilege flag derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub session_key: String,
    pub profile: AuthenticatedProfile,
    pub is_collaborator: bool,
    pub published_at: DateTime<Utc>,
}

/// Shared profile state. The verifier is the only writer; everything else reads.
/// The privilege flag is never stored on its own, only recomputed on publish.
#[derive(Debug, Default)]
pub struct ProfileStore {
    inner: RwLock<Option<ProfileRecord>>,
}

impl ProfileStore {
    pub fn new() -> Self { Self::default() }

    pub fn publish(&self, session_key: &str, profile: AuthenticatedProfile) -> ProfileRecord {
        let record = ProfileRecord {
            session_key: session_key.to_string(),
            is_collaborator: is_collaborator(&profile.role),
            profile,
            published_at: Utc::now(),
        };
        *self.inner.write() = Some(record.clone());
        record
    }

    pub fn current(&self) -> Option<ProfileRecord> { self.inner.read().clone() }

    /// Cached profile, only if it belongs to `session_key`.
    pub fn cached_for(&self, session_key: &str) -> Option<AuthenticatedProfile> {
        self.inner
            .read()
            .as_ref()
            .filter(|r| r.session_key == session_key)
            .map(|r| r.profile.clone())
    }

    pub fn is_collaborator(&self) -> bool {
        self.inner.read().as_ref().map(|r| r.is_collaborator).unwrap_or(false)
    }

    pub fn clear(&self) { *self.inner.write() = None; }
}
