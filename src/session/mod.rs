//! Startup coordination for a signed-in (or signed-out) browser context: profile verification,
//! reference data, the readiness signal and the auth-expiry exit path.

mod auth_failure;
mod readiness;
mod reference;
mod store;
mod verifier;

pub use auth_failure::{
    AuthFailureHandler, Navigator, Notice, NoticeLevel, NoticeSink, TracingNavigator, TracingNotices, SESSION_EXPIRED_NOTICE,
};
pub use readiness::{ReadinessCoordinator, ReadinessState, ReferenceStatus};
pub use reference::{Commune, CommuneLoader, ReferenceDataLoader, ReferenceSnapshot, REFERENCE_DATA_PATH};
pub use store::{ProfileRecord, ProfileStore};
pub use verifier::{ProfileVerifier, VerifierPhase, VerifierSnapshot, VerifyOutcome, PROFILE_VERIFY_PATH};
