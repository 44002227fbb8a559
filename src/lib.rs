pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod services;
pub mod session;

pub use app::Portal;
pub use config::PortalConfig;
pub use error::{PortalError, PortalResult, ProviderError, RequestError};
