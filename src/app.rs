//! Wiring of the request layer and startup coordination for one browser context.

use std::sync::Arc;

use futures_util::future::join;
use tracing::info;

use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::http::{HttpTransport, RequestExecutor, ReqwestTransport};
use crate::identity::{IdentityProvider, TokenSource};
use crate::services::Services;
use crate::session::{
    AuthFailureHandler, CommuneLoader, Navigator, NoticeSink, ProfileStore, ProfileVerifier, ReadinessCoordinator,
    ReadinessState, VerifyOutcome,
};

/// Everything one context needs, built once and shared by reference.
#[derive(Clone)]
pub struct Portal {
    pub config: PortalConfig,
    pub tokens: Arc<TokenSource>,
    pub executor: Arc<RequestExecutor>,
    pub profiles: Arc<ProfileStore>,
    pub verifier: Arc<ProfileVerifier>,
    pub communes: Arc<CommuneLoader>,
    pub readiness: Arc<ReadinessCoordinator>,
    pub auth_failure: Arc<AuthFailureHandler>,
    pub services: Services,
}

impl Portal {
    /// Build against the configured backend over reqwest.
    pub fn from_config(
        config: PortalConfig,
        provider: Arc<dyn IdentityProvider>,
        notices: Arc<dyn NoticeSink>,
        navigator: Arc<dyn Navigator>,
    ) -> PortalResult<Self> {
        let base = config.base_url()?;
        let transport = ReqwestTransport::new(base).map_err(PortalError::from)?;
        Ok(Self::new(config, provider, Arc::new(transport), notices, navigator))
    }

    pub fn new(
        config: PortalConfig,
        provider: Arc<dyn IdentityProvider>,
        transport: Arc<dyn HttpTransport>,
        notices: Arc<dyn NoticeSink>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        info!(target: "adoption_portal::app", backend = %transport.ident(), "portal init");
        let tokens = Arc::new(TokenSource::new(provider.clone(), config.auth_scopes.clone()));
        let executor = Arc::new(RequestExecutor::new(transport, tokens.clone()));
        let profiles = Arc::new(ProfileStore::new());
        let auth_failure = Arc::new(
            AuthFailureHandler::new(provider, notices, navigator).with_entry_point(config.public_entry.clone()),
        );
        let verifier = Arc::new(ProfileVerifier::new(executor.clone(), profiles.clone(), auth_failure.clone()));
        let communes = Arc::new(CommuneLoader::new(executor.clone()));
        let services = Services::new(executor.clone());
        Self {
            config,
            tokens,
            executor,
            profiles,
            verifier,
            communes,
            readiness: Arc::new(ReadinessCoordinator::new()),
            auth_failure,
            services,
        }
    }

    /// Run profile verification and reference loading side by side, folding each completion
    /// into the readiness coordinator. Returns the latched readiness signal.
    pub async fn start(&self) -> bool {
        let session = self.tokens.active_session();
        self.observe();
        let profile = async {
            self.verifier.verify(session.as_ref()).await;
            self.observe();
        };
        let reference = async {
            self.communes.load_if_absent().await;
            self.observe();
        };
        join(profile, reference).await;
        let ready = self.readiness.initial_load_complete();
        info!(target: "adoption_portal::app", ready, signed_in = session.is_some(), "startup pass finished");
        ready
    }

    /// Call whenever the provider's account pool may have changed (sign-in, sign-out).
    pub async fn on_session_changed(&self) -> bool { self.start().await }

    /// Force a fresh backend verification for the current session.
    pub async fn reload_profile(&self) -> VerifyOutcome {
        let session = self.tokens.active_session();
        let out = self.verifier.reload(session.as_ref()).await;
        self.observe();
        out
    }

    pub fn on_unload(&self) { self.readiness.on_unload(); }

    pub fn readiness_state(&self) -> ReadinessState { self.readiness.state() }

    pub fn is_collaborator(&self) -> bool { self.profiles.is_collaborator() }

    fn observe(&self) -> bool { self.readiness.observe(&self.verifier.snapshot(), &self.communes.status()) }
}
