//! Thin wrappers that domain screens use to reach the backend. Payloads pass through as
//! JSON; failures are returned to the caller and never trigger a global sign-out.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::RequestError;
use crate::http::RequestExecutor;

pub const ANIMALS_PATH: &str = "/animales";
pub const ADOPTIONS_PATH: &str = "/adopciones";
pub const FOLLOW_UPS_PATH: &str = "/seguimientos";
pub const ORGANIZATIONS_PATH: &str = "/organizaciones";
pub const USERS_PATH: &str = "/usuarios";

/// CRUD over one backend collection.
#[derive(Clone)]
pub struct ResourceService {
    executor: Arc<RequestExecutor>,
    base_path: String,
}

impl ResourceService {
    pub fn new<S: Into<String>>(executor: Arc<RequestExecutor>, base_path: S) -> Self {
        Self { executor, base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &str { &self.base_path }

    pub fn item_path(&self, id: &str) -> String { format!("{}/{}", self.base_path.trim_end_matches('/'), id) }

    pub async fn list<T: DeserializeOwned>(&self) -> Result<T, RequestError> { self.executor.get(&self.base_path).await }

    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<T, RequestError> {
        self.executor.get(&self.item_path(id)).await
    }

    pub async fn create<T, B>(&self, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.executor.post(&self.base_path, Some(body)).await
    }

    pub async fn update<T, B>(&self, id: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.executor.put(&self.item_path(id), Some(body)).await
    }

    pub async fn remove(&self, id: &str) -> Result<Value, RequestError> { self.executor.delete(&self.item_path(id)).await }
}

/// The collections the admin dashboard works with.
#[derive(Clone)]
pub struct Services {
    pub animals: ResourceService,
    pub adoptions: ResourceService,
    pub follow_ups: ResourceService,
    pub organizations: ResourceService,
    pub users: ResourceService,
}

impl Services {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            animals: ResourceService::new(executor.clone(), ANIMALS_PATH),
            adoptions: ResourceService::new(executor.clone(), ADOPTIONS_PATH),
            follow_ups: ResourceService::new(executor.clone(), FOLLOW_UPS_PATH),
            organizations: ResourceService::new(executor.clone(), ORGANIZATIONS_PATH),
            users: ResourceService::new(executor, USERS_PATH),
        }
    }
}
