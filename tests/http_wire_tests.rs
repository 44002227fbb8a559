use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

use adoption_portal::http::{Anonymous, HttpTransport, ReqwestTransport, RequestExecutor};
use adoption_portal::identity::{Account, StaticTokenProvider, TokenSource};
use adoption_portal::RequestError;

async fn comunas(headers: HeaderMap) -> impl IntoResponse {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
    Json(json!([{"id": 1, "nombre": "Ñuñoa", "auth": auth}]))
}

async fn verificar(Json(body): Json<Value>) -> impl IntoResponse {
    Json(json!({"usuario": {"id": 5, "nombre": "Ana", "rol": "ADMIN", "echo": body}}))
}

async fn borrar() -> StatusCode { StatusCode::NO_CONTENT }

async fn vacio() -> StatusCode { StatusCode::OK }

async fn roto() -> impl IntoResponse { (StatusCode::INTERNAL_SERVER_ERROR, "{\"error\": \"boom\"}") }

async fn expirado() -> StatusCode { StatusCode::UNAUTHORIZED }

// Serve the mock backend on an ephemeral localhost port; abort the handle to stop it.
async fn start_backend() -> (JoinHandle<()>, Url) {
    let app = Router::new()
        .route("/api/comunas", get(comunas))
        .route("/api/usuarios/perfil/verificar", post(verificar))
        .route("/api/animales/{id}", delete(borrar))
        .route("/api/vacio", get(vacio))
        .route("/api/roto", get(roto))
        .route("/api/expirado", get(expirado));
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock backend error: {e:?}");
        }
    });
    (handle, Url::parse(&format!("http://127.0.0.1:{}/api", port)).unwrap())
}

struct Guard(JoinHandle<()>);
impl Drop for Guard {
    fn drop(&mut self) { self.0.abort(); }
}

fn signed_in_executor(base: Url) -> RequestExecutor {
    let provider = Arc::new(StaticTokenProvider::signed_in(Account::new("h1", "ana@example.org"), "wire-token".into()));
    let tokens = Arc::new(TokenSource::new(provider, vec![]));
    RequestExecutor::new(Arc::new(ReqwestTransport::new(base).unwrap()), tokens)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bearer_token_reaches_backend() {
    let (srv, base) = start_backend().await;
    let _g = Guard(srv);
    let ex = signed_in_executor(base);
    let v: Value = ex.get("/comunas").await.unwrap();
    assert_eq!(v[0]["nombre"], "Ñuñoa");
    assert_eq!(v[0]["auth"], "Bearer wire-token");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn anonymous_call_has_no_authorization() {
    let (srv, base) = start_backend().await;
    let _g = Guard(srv);
    let ex = RequestExecutor::new(Arc::new(ReqwestTransport::new(base).unwrap()), Arc::new(Anonymous));
    let v: Value = ex.get("/comunas").await.unwrap();
    assert_eq!(v[0]["auth"], "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn json_body_is_sent_and_echoed() {
    let (srv, base) = start_backend().await;
    let _g = Guard(srv);
    let ex = signed_in_executor(base);
    let v: Value = ex.post("/usuarios/perfil/verificar", Some(&json!({"email": "ana@example.org"}))).await.unwrap();
    assert_eq!(v["usuario"]["echo"]["email"], "ana@example.org");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_bodies_resolve_to_empty_object() {
    let (srv, base) = start_backend().await;
    let _g = Guard(srv);
    let ex = signed_in_executor(base);
    let v: Value = ex.delete("/animales/4").await.unwrap();
    assert_eq!(v, json!({}));
    let v: Value = ex.get("/vacio").await.unwrap();
    assert_eq!(v, json!({}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn error_statuses_surface_code_and_reason() {
    let (srv, base) = start_backend().await;
    let _g = Guard(srv);
    let ex = signed_in_executor(base);
    let err = ex.get::<Value>("/roto").await.unwrap_err();
    assert_eq!(err, RequestError::HttpStatus { status: 500, status_text: "Internal Server Error".into() });
    let err = ex.get::<Value>("/expirado").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    let err = ex.get::<Value>("/no-such-route").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let t = ReqwestTransport::new(Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap()).unwrap();
    assert!(t.ident().starts_with("http:"));
    let ex = RequestExecutor::new(Arc::new(t), Arc::new(Anonymous));
    let err = ex.get::<Value>("/comunas").await.unwrap_err();
    assert!(matches!(err, RequestError::Network { .. }));
}

// Answers every connection with one fixed raw HTTP/1.1 response.
async fn start_raw_backend(response: &'static str) -> (JoinHandle<()>, Url) {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let _ = sock.write_all(response.as_bytes()).await;
            let _ = sock.shutdown().await;
        }
    });
    (handle, Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn custom_reason_phrase_is_kept_for_classification() {
    let (srv, base) =
        start_raw_backend("HTTP/1.1 500 Session expired\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
    let _g = Guard(srv);
    let ex = RequestExecutor::new(Arc::new(ReqwestTransport::new(base).unwrap()), Arc::new(Anonymous));
    let err = ex.get::<Value>("/comunas").await.unwrap_err();
    assert_eq!(err, RequestError::HttpStatus { status: 500, status_text: "Session expired".into() });
    let err = err.classify_auth();
    assert!(err.is_auth_expired());
    assert_eq!(err.status(), Some(500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn canonical_reason_used_when_phrase_is_standard() {
    let (srv, base) =
        start_raw_backend("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
    let _g = Guard(srv);
    let ex = RequestExecutor::new(Arc::new(ReqwestTransport::new(base).unwrap()), Arc::new(Anonymous));
    let err = ex.get::<Value>("/comunas").await.unwrap_err();
    assert_eq!(err, RequestError::HttpStatus { status: 503, status_text: "Service Unavailable".into() });
}
