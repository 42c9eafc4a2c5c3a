use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use tracing::{Level, info};
use tracing_subscriber::fmt::format::FmtSpan;

use crate::db::{self, SqliteUserDirectory};
use crate::error::{DirectoryError, HashError};
use crate::models::user::User;
use crate::services::auth_service::AuthService;
use crate::services::directory::{PasswordHasher, UserDirectory};
use crate::services::token_service::TokenService;
use crate::state::AppState;
use crate::utils::password::BcryptHasher;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only";

static INIT: Once = Once::new();

/// Initialize logging exactly once
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_target(false)
            .with_thread_ids(true)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_max_level(Level::ERROR)
            .with_span_events(FmtSpan::NONE)
            .init();
    });
}

pub async fn setup_test_db() -> SqlitePool {
    init_tracing();
    info!("Setting up test database");

    db::create_db_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

/// Cheapest cost bcrypt accepts, to keep tests fast.
pub fn test_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(BcryptHasher::new(4))
}

pub fn test_tokens() -> TokenService {
    TokenService::new(TEST_SECRET)
}

pub async fn create_test_app() -> Router {
    let pool = setup_test_db().await;
    let hasher = test_hasher();
    let directory = Arc::new(SqliteUserDirectory::new(pool, hasher.clone()));
    let auth = AuthService::new(directory, hasher, test_tokens());

    crate::create_router(AppState::new(auth, Duration::from_secs(5)))
}

pub async fn test_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, HeaderMap) {
    info!(method = %method, uri = %uri, "Making test request");

    let body = match body {
        Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
        None => Body::empty(),
    };

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    info!(status = %status, body = %body, "Test response received");
    (status, body, headers)
}

/* ---------- SCRIPTED COLLABORATORS ---------- */

/// In-memory directory handing out ids `u1`, `u2`, ... with an optional
/// artificial latency before each call does its work.
#[derive(Default)]
pub struct StubDirectory {
    users: Mutex<HashMap<String, User>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl StubDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl UserDirectory for StubDirectory {
    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<String, DirectoryError> {
        self.pause().await;

        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(DirectoryError::AlreadyExists);
        }

        let id = format!("u{}", users.len() + 1);
        users.insert(
            email.to_string(),
            User {
                id: id.clone(),
                email: email.to_string(),
                username: username.to_string(),
                password_hash: stub_hash(password),
            },
        );
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, DirectoryError> {
        self.pause().await;

        let user = self
            .users
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or(DirectoryError::NotFound)?;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(user)
    }
}

fn stub_hash(plaintext: &str) -> String {
    format!("stub${plaintext}")
}

/// Compares against the `stub$<plaintext>` scheme used by `StubDirectory`.
#[derive(Default)]
pub struct StubHasher;

#[async_trait]
impl PasswordHasher for StubHasher {
    async fn hash_password(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(stub_hash(plaintext))
    }

    async fn compare_password(&self, plaintext: &str, stored_hash: &str) -> Result<(), HashError> {
        if !stored_hash.starts_with("stub$") {
            return Err(HashError::Failed("unrecognised hash".to_string()));
        }
        if stub_hash(plaintext) == stored_hash {
            Ok(())
        } else {
            Err(HashError::Mismatch)
        }
    }
}

pub fn stub_auth_service(directory: Arc<StubDirectory>) -> AuthService {
    init_tracing();
    AuthService::new(directory, Arc::new(StubHasher), test_tokens())
}
