//! End-to-end tests: a real `KademyClient` against a fake backend served
//! by `axum` on a random port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use kademy::prelude::*;
use serde_json::{Value, json};
use url::Url;

const EMAIL: &str = "teacher@example.com";
const PASSWORD: &str = "s3cret-pass";

// =========================================================================
// Fake backend
// =========================================================================

#[derive(Default)]
struct Api {
    access: Mutex<Option<String>>,
    refresh: Mutex<Option<String>>,
    issued: AtomicUsize,
    refresh_calls: AtomicUsize,
    refresh_disabled: Mutex<bool>,
}

impl Api {
    fn issue(&self) -> (String, String) {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let pair = (format!("access-{n}"), format!("refresh-{n}"));
        *self.access.lock().unwrap() = Some(pair.0.clone());
        *self.refresh.lock().unwrap() = Some(pair.1.clone());
        pair
    }

    fn expire_access(&self) {
        *self.access.lock().unwrap() = None;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let presented = headers.get("authorization").and_then(|v| v.to_str().ok());
        let expected = self
            .access
            .lock()
            .unwrap()
            .as_ref()
            .map(|a| format!("Bearer {a}"));
        presented.is_some() && presented == expected.as_deref()
    }
}

type Reply = (StatusCode, Json<Value>);

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
}

fn user() -> Value {
    json!({"id": 3, "email": EMAIL, "first_name": "Grace", "last_name": "Hopper", "role": "TEACHER"})
}

async fn login(State(api): State<Arc<Api>>, Json(body): Json<Value>) -> Reply {
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": 400, "message": "Invalid credentials", "fields": null})),
        );
    }
    let (access, refresh) = api.issue();
    (
        StatusCode::OK,
        Json(json!({"user": user(), "tokens": {"access": access, "refresh": refresh}})),
    )
}

async fn refresh(State(api): State<Arc<Api>>, Json(body): Json<Value>) -> Reply {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let current = api.refresh.lock().unwrap().clone();
    let disabled = *api.refresh_disabled.lock().unwrap();
    if disabled || current.is_none() || body["refresh"].as_str() != current.as_deref() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        );
    }
    let (access, refresh) = api.issue();
    (StatusCode::OK, Json(json!({"access": access, "refresh": refresh})))
}

async fn profile(State(api): State<Arc<Api>>, headers: HeaderMap) -> Reply {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(user()))
}

async fn books(State(api): State<Arc<Api>>, headers: HeaderMap) -> Reply {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!([{"id": 1, "title": "Algebra I"}, {"id": 2, "title": "Biology"}])),
    )
}

async fn book(State(api): State<Arc<Api>>, headers: HeaderMap, Path(id): Path<u32>) -> Reply {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    if id == 1 {
        (StatusCode::OK, Json(json!({"id": 1, "title": "Algebra I"})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})))
    }
}

/// Starts the fake backend and returns its base URL.
async fn start_backend(api: Arc<Api>) -> Url {
    let app = Router::new()
        .route("/api/v1/auth/login/", post(login))
        .route("/api/v1/auth/refresh/", post(refresh))
        .route("/api/v1/auth/profile/", get(profile))
        .route("/api/v1/books/", get(books))
        .route("/api/v1/books/{id}/", get(book))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Url::parse(&format!("http://{addr}")).expect("valid url")
}

async fn client_for(api: &Arc<Api>) -> KademyClient<MemoryTokenStore> {
    let base_url = start_backend(Arc::clone(api)).await;
    KademyClient::builder()
        .base_url(base_url)
        .request_timeout(Duration::from_secs(5))
        .build_with_store(MemoryTokenStore::new())
        .expect("client")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_login_then_list_books() {
    let api = Arc::new(Api::default());
    let client = client_for(&api).await;

    let user = client.session().login(EMAIL, PASSWORD).await.expect("login");
    assert_eq!(user.role, Role::Teacher);

    let books = client.list(Resource::Books).await.expect("books");
    assert_eq!(books.as_array().map(Vec::len), Some(2));

    let book = client.get(Resource::Books, 1).await.expect("book");
    assert_eq!(book["title"], "Algebra I");
}

#[tokio::test]
async fn test_invalid_login_is_rejected_with_backend_message() {
    let api = Arc::new(Api::default());
    let client = client_for(&api).await;

    let err = client.session().login(EMAIL, "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(client.session().credentials().await.is_none());
}

#[tokio::test]
async fn test_missing_item_is_rejected() {
    let api = Arc::new(Api::default());
    let client = client_for(&api).await;
    client.session().login(EMAIL, PASSWORD).await.expect("login");

    let err = client.get(Resource::Books, 99).await.unwrap_err();

    assert!(matches!(
        err,
        KademyError::Session(SessionError::Rejected {
            status: Some(404),
            ..
        })
    ));
}

#[tokio::test]
async fn test_expired_access_is_refreshed_once_for_concurrent_requests() {
    let api = Arc::new(Api::default());
    let client = Arc::new(client_for(&api).await);
    client.session().login(EMAIL, PASSWORD).await.expect("login");
    api.expire_access();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(
            async move { client.list(Resource::Books).await },
        ));
    }
    for handle in handles {
        handle.await.expect("join").expect("books after refresh");
    }

    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.session().credentials().await,
        Some(CredentialPair::new("access-2", "refresh-2"))
    );
}

#[tokio::test]
async fn test_rejected_refresh_logs_out() {
    let api = Arc::new(Api::default());
    let client = client_for(&api).await;
    client.session().login(EMAIL, PASSWORD).await.expect("login");
    api.expire_access();
    *api.refresh_disabled.lock().unwrap() = true;

    let err = client.list(Resource::Books).await.unwrap_err();

    assert!(matches!(
        err,
        KademyError::Session(SessionError::RefreshFailed(_))
    ));
    assert_eq!(client.session().status().await, SessionStatus::Anonymous);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop a listener so nothing is listening on the port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = KademyClient::builder()
        .base_url(Url::parse(&format!("http://{addr}")).unwrap())
        .build_with_store(MemoryTokenStore::new())
        .unwrap();

    let err = client.list(Resource::Institutes).await.unwrap_err();
    assert!(matches!(err, KademyError::Session(SessionError::Transport(_))));
}

#[tokio::test]
async fn test_file_store_session_survives_restart() {
    let api = Arc::new(Api::default());
    let base_url = start_backend(Arc::clone(&api)).await;
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let client = KademyClient::builder()
            .base_url(base_url.clone())
            .token_dir(dir.path())
            .build()
            .expect("client");
        client.session().login(EMAIL, PASSWORD).await.expect("login");
    }
    assert!(dir.path().join("tokens.json").exists());

    let restarted = KademyClient::builder()
        .base_url(base_url)
        .token_dir(dir.path())
        .build()
        .expect("client");
    assert_eq!(restarted.session().status().await, SessionStatus::Pending);

    let identity = restarted.session().check_auth().await.expect("check_auth");
    assert_eq!(identity.map(|i| i.email), Some(EMAIL.to_string()));

    restarted.session().logout().await.expect("logout");
    assert!(!dir.path().join("tokens.json").exists());
}
