#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use adoption_portal::http::{HttpTransport, RawResponse, RequestDescriptor};
use adoption_portal::identity::{Account, IdentityProvider};
use adoption_portal::session::{Navigator, Notice, NoticeSink};
use adoption_portal::{Portal, PortalConfig, ProviderError, RequestError};

/// One scripted reply for a path.
#[derive(Clone)]
pub enum Reply {
    Respond(RawResponse),
    After(Duration, RawResponse),
    Fail(RequestError),
    Hang,
}

impl Reply {
    pub fn json(status: u16, v: Value) -> Self { Reply::Respond(RawResponse::new(status, v.to_string())) }
    pub fn text(status: u16, body: &str) -> Self { Reply::Respond(RawResponse::new(status, body)) }
}

/// Transport answering from a per-path script; the last reply for a path repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
    seen: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn on(&self, path: &str, reply: Reply) -> &Self {
        self.script.lock().entry(path.to_string()).or_default().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RequestDescriptor> { self.seen.lock().clone() }

    pub fn calls_to(&self, path: &str) -> usize { self.seen.lock().iter().filter(|r| r.path == path).count() }

    pub fn last_call(&self) -> Option<RequestDescriptor> { self.seen.lock().last().cloned() }

    fn next_reply(&self, path: &str) -> Reply {
        let mut script = self.script.lock();
        match script.get_mut(path) {
            Some(q) if q.len() > 1 => q.pop_front().unwrap_or(Reply::Hang),
            Some(q) => q.front().cloned().unwrap_or(Reply::Hang),
            None => Reply::text(404, ""),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, req: &RequestDescriptor) -> Result<RawResponse, RequestError> {
        self.seen.lock().push(req.clone());
        match self.next_reply(&req.path) {
            Reply::Respond(r) => Ok(r),
            Reply::After(d, r) => {
                tokio::time::sleep(d).await;
                Ok(r)
            }
            Reply::Fail(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }

    fn ident(&self) -> String { "scripted".into() }
}

/// Identity provider with a mutable account pool and call counters.
#[derive(Default)]
pub struct FakeProvider {
    pub accounts: Mutex<Vec<Account>>,
    pub token: Mutex<Option<String>>,
    pub token_fails: Mutex<bool>,
    pub sign_out_fails: Mutex<bool>,
    pub token_calls: AtomicUsize,
    pub cache_clears: AtomicUsize,
    pub sign_outs: AtomicUsize,
}

impl FakeProvider {
    pub fn signed_in(account: Account, token: &str) -> Arc<Self> {
        let p = Self::default();
        *p.accounts.lock() = vec![account];
        *p.token.lock() = Some(token.to_string());
        Arc::new(p)
    }

    pub fn anonymous() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn set_accounts(&self, accounts: Vec<Account>) { *self.accounts.lock() = accounts; }

    pub fn sign_out_count(&self) -> usize { self.sign_outs.load(Ordering::SeqCst) }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn accounts(&self) -> Vec<Account> { self.accounts.lock().clone() }

    async fn acquire_token_silent(&self, _account: &Account, _scopes: &[String]) -> Result<String, ProviderError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if *self.token_fails.lock() {
            return Err(ProviderError::InteractionRequired("consent".into()));
        }
        self.token.lock().clone().ok_or(ProviderError::NoAccount)
    }

    fn clear_token_cache(&self) { self.cache_clears.fetch_add(1, Ordering::SeqCst); }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if *self.sign_out_fails.lock() {
            return Err(ProviderError::Failed("popup blocked".into()));
        }
        self.accounts.lock().clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotices(pub Mutex<Vec<Notice>>);

impl NoticeSink for RecordingNotices {
    fn show(&self, notice: Notice) { self.0.lock().push(notice); }
}

#[derive(Default)]
pub struct RecordingNavigator(pub Mutex<Vec<String>>);

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) { self.0.lock().push(target.to_string()); }
}

pub struct Harness {
    pub portal: Portal,
    pub transport: Arc<ScriptedTransport>,
    pub provider: Arc<FakeProvider>,
    pub notices: Arc<RecordingNotices>,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn harness(transport: Arc<ScriptedTransport>, provider: Arc<FakeProvider>) -> Harness {
    let notices = Arc::new(RecordingNotices::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let portal = Portal::new(
        PortalConfig::default(),
        provider.clone(),
        transport.clone(),
        notices.clone(),
        navigator.clone(),
    );
    Harness { portal, transport, provider, notices, navigator }
}

pub fn ana() -> Account { Account::new("home-ana", "ana@example.org").with_name("Ana") }

pub fn bruno() -> Account { Account::new("home-bruno", "bruno@example.org").with_name("Bruno") }
