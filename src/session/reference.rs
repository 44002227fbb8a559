use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::readiness::ReferenceStatus;
use crate::error::RequestError;
use crate::http::RequestExecutor;

pub const REFERENCE_DATA_PATH: &str = "/comunas";

/// Location entry from `GET /comunas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commune {
    #[serde(alias = "idComuna")]
    pub id: i64,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default)]
    pub region: Option<Value>,
}

pub type CommuneLoader = ReferenceDataLoader<Commune>;

#[derive(Debug, Clone)]
pub struct ReferenceSnapshot<T> {
    pub data: Arc<Vec<T>>,
    pub loading: bool,
    pub error: Option<String>,
}

struct ReferenceState<T> {
    data: Arc<Vec<T>>,
    loading: bool,
    error: Option<String>,
}

/// Load-if-absent cache for a small lookup list. Errors stay local to the loader.
pub struct ReferenceDataLoader<T> {
    executor: Arc<RequestExecutor>,
    path: String,
    state: RwLock<ReferenceState<T>>,
    load_lock: tokio::sync::Mutex<()>,
}

/// Clears `loading` even when the fetch future is dropped mid-flight.
struct LoadingGuard<'a, T>(&'a RwLock<ReferenceState<T>>);

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) { self.0.write().loading = false; }
}

impl<T> ReferenceDataLoader<T>
where
    T: DeserializeOwned + Send + Sync,
{
    pub fn new(executor: Arc<RequestExecutor>) -> Self { Self::with_path(executor, REFERENCE_DATA_PATH) }

    pub fn with_path<S: Into<String>>(executor: Arc<RequestExecutor>, path: S) -> Self {
        Self {
            executor,
            path: path.into(),
            state: RwLock::new(ReferenceState { data: Arc::new(Vec::new()), loading: false, error: None }),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> ReferenceSnapshot<T> {
        let st = self.state.read();
        ReferenceSnapshot { data: st.data.clone(), loading: st.loading, error: st.error.clone() }
    }

    pub fn status(&self) -> ReferenceStatus {
        let st = self.state.read();
        ReferenceStatus { loading: st.loading, len: st.data.len(), error: st.error.clone() }
    }

    /// Fetch only when nothing is held. Concurrent callers share one fetch.
    pub async fn load_if_absent(&self) -> ReferenceSnapshot<T> {
        let _lock = self.load_lock.lock().await;
        if !self.state.read().data.is_empty() {
            return self.snapshot();
        }
        self.fetch().await;
        self.snapshot()
    }

    /// Unconditional refetch, e.g. from a retry action.
    pub async fn reload(&self) -> ReferenceSnapshot<T> {
        let _lock = self.load_lock.lock().await;
        self.fetch().await;
        self.snapshot()
    }

    async fn fetch(&self) {
        {
            let mut st = self.state.write();
            st.loading = true;
            st.error = None;
        }
        let _loading = LoadingGuard(&self.state);
        let result = self.executor.get::<Value>(&self.path).await.and_then(decode_list::<T>);
        let mut st = self.state.write();
        match result {
            Ok(items) => {
                debug!(target: "adoption_portal::session", path = %self.path, count = items.len(), "reference data loaded");
                st.data = Arc::new(items);
            }
            Err(e) => {
                warn!(target: "adoption_portal::session", path = %self.path, error = %e, "reference data load failed");
                st.error = Some(e.to_string());
            }
        }
    }
}

/// Bare array, or an object carrying the array under `data`.
fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, RequestError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("data") {
            Some(inner @ Value::Array(_)) => inner,
            // empty success body
            None if map.is_empty() => Value::Array(Vec::new()),
            _ => return Err(RequestError::parse("expected a JSON array")),
        },
        _ => return Err(RequestError::parse("expected a JSON array")),
    };
    serde_json::from_value(list).map_err(|e| RequestError::parse(e.to_string()))
}
