use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PortalError, PortalResult};

const ENVELOPE_KEYS: [&str; 3] = ["usuario", "user", "data"];
const ID_KEYS: [&str; 3] = ["id", "idUsuario", "_id"];
const NAME_KEYS: [&str; 4] = ["displayName", "nombre", "name", "nombreCompleto"];
const EMAIL_KEYS: [&str; 2] = ["email", "correo"];
const ROLE_KEYS: [&str; 2] = ["role", "rol"];

/// Backend-verified profile of the signed-in user. `raw` keeps every field the backend sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub raw: Value,
}

impl AuthenticatedProfile {
    /// Accepts the profile object directly or wrapped under `usuario`/`user`/`data`.
    pub fn from_backend(value: Value) -> PortalResult<Self> {
        let obj = unwrap_envelope(value);
        let Some(map) = obj.as_object() else {
            return Err(PortalError::Profile("expected a JSON object".into()));
        };
        let id = first_of(map, &ID_KEYS).ok_or_else(|| PortalError::Profile("missing user id".into()))?;
        Ok(Self {
            id,
            display_name: first_of(map, &NAME_KEYS).unwrap_or_default(),
            email: first_of(map, &EMAIL_KEYS).unwrap_or_default(),
            role: first_of(map, &ROLE_KEYS).unwrap_or_default(),
            raw: obj,
        })
    }
}

fn unwrap_envelope(value: Value) -> Value {
    if let Value::Object(map) = &value {
        for k in ENVELOPE_KEYS {
            if let Some(inner) = map.get(k).filter(|v| v.is_object()) {
                return inner.clone();
            }
        }
    }
    value
}

fn first_of(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match map.get(*k) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        // role may arrive as {"nombre": "..."}
        Some(Value::Object(o)) => o.get("nombre").or_else(|| o.get("name")).and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    })
}
