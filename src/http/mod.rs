//! Authenticated request layer over the backend JSON API.

mod executor;
mod request;
mod transport;

pub use executor::{Anonymous, CredentialInterceptor, RequestExecutor};
pub use request::{Method, RawResponse, RequestDescriptor};
pub use transport::{HttpTransport, ReqwestTransport};
