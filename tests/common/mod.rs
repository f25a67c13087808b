//! Shared helpers for API-level tests

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Router};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Months, NaiveDate, Utc};
use member_manager_backend::api;
use member_manager_backend::api::utils::RouterState;
use member_manager_backend::auth::AuthenticatedUser;
use member_manager_backend::error::AppError;
use member_manager_backend::members::MemberDb;
use member_manager_backend::services::photo_storage::StorageServiceError;
use member_manager_backend::services::{DeletionResult, PhotoStorage, UploadResult};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Test double for the cloud media service
///
/// Records deletion calls and can be primed with service-level errors.
#[derive(Default)]
pub struct StubStorage {
    pub upload_error: Option<String>,
    pub delete_error: Option<String>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl PhotoStorage for StubStorage {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> Result<UploadResult, AppError> {
        if let Some(message) = &self.upload_error {
            return Ok(UploadResult {
                secure_url: None,
                public_id: None,
                error: Some(StorageServiceError {
                    message: message.clone(),
                }),
            });
        }
        Ok(UploadResult {
            secure_url: Some(format!("https://cdn.example/{}", file_name)),
            public_id: Some(format!("stub/{}", file_name)),
            error: None,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<DeletionResult, AppError> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        if let Some(message) = &self.delete_error {
            return Ok(DeletionResult {
                result: None,
                error: Some(StorageServiceError {
                    message: message.clone(),
                }),
            });
        }
        Ok(DeletionResult {
            result: Some("ok".to_string()),
            error: None,
        })
    }
}

/// Fresh repository over a throwaway database file
pub async fn setup_db() -> (TempDir, Arc<MemberDb>) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("members.db");
    let db = MemberDb::new(path.to_str().unwrap()).await.expect("db init");
    (dir, Arc::new(db))
}

/// Member routes with a fixed authenticated caller (auth middleware bypassed)
pub fn router_as(state: RouterState, username: &str) -> Router {
    member_routes()
        .layer(Extension(AuthenticatedUser {
            username: username.to_string(),
        }))
        .with_state(state)
}

/// Member routes behind the real auth middleware
pub fn router_with_auth(state: RouterState) -> Router {
    member_routes()
        .layer(axum::middleware::from_fn(
            member_manager_backend::auth::require_auth,
        ))
        .with_state(state)
}

fn member_routes() -> Router<RouterState> {
    Router::new()
        .route(
            "/api/users",
            get(api::users::list_users).put(api::users::update_user),
        )
        .route("/api/users/:username", get(api::users::get_user))
        .route("/api/users/add-photo", post(api::photos::add_photo))
        .route(
            "/api/users/set-main-photo/:photoID",
            put(api::photos::set_main_photo),
        )
        .route(
            "/api/users/delete-photo/:photoID",
            delete(api::photos::delete_photo),
        )
}

/// Insert a user row directly; returns its id
pub async fn seed_user(db: &MemberDb, username: &str, gender: &str, age: i32) -> i64 {
    let dob = dob_for_age(age);
    let result = sqlx::query(
        "INSERT INTO users (username, known_as, gender, date_of_birth, city, country, created, last_active) \
         VALUES (?, ?, ?, ?, 'Testville', 'Testland', 1700000000, 1700000000)",
    )
    .bind(username)
    .bind(username)
    .bind(gender)
    .bind(dob)
    .execute(db.pool())
    .await
    .expect("seed user");
    result.last_insert_rowid()
}

pub fn dob_for_age(age: i32) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(age as u32 * 12 + 6))
        .unwrap()
}

/// Unsigned JWT carrying the given username, accepted by the auth middleware
pub fn token_for(username: &str) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS512","typ":"JWT"}"#);
    let payload =
        general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"unique_name":"{}"}}"#, username));
    format!("{}.{}.signature", header, payload)
}

/// Multipart POST with a single image file field
pub fn multipart_file_request(uri: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-7d9f1e";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"pic.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n",
            boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Read a response body into JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
