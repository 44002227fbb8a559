//! Identity-provider seam, silent token resolution and the verified user profile.
//! Keep the public surface thin and split implementation across sub-modules.

mod account;
mod privilege;
mod profile;
mod provider;
mod token_source;

pub use account::{active_account, Account};
pub use privilege::{is_collaborator, COLLABORATOR_ROLES};
pub use profile::AuthenticatedProfile;
pub use provider::{IdentityProvider, StaticTokenProvider};
pub use token_source::TokenSource;
