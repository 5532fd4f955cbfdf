//! UwriteClient tests against an in-process fake of the Uwrite API

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use uwrite_review::config::UwriteConfig;
use uwrite_review::models::{ContentResource, MemoryResource};
use uwrite_review::services::{CheckClient, CheckType, UwriteClient, UwriteError};

/// What GET /checks/:id answers
#[derive(Clone)]
enum CheckScript {
    Done,
    Failed,
    Running,
}

#[derive(Clone)]
struct FakeApi {
    script: CheckScript,
    /// Reject every request with 401
    reject_auth: bool,
    uploads: Arc<Mutex<Vec<String>>>,
    checks: Arc<Mutex<Vec<Value>>>,
    authorizations: Arc<Mutex<Vec<String>>>,
}

impl FakeApi {
    fn new(script: CheckScript) -> Self {
        Self {
            script,
            reject_auth: false,
            uploads: Arc::new(Mutex::new(Vec::new())),
            checks: Arc::new(Mutex::new(Vec::new())),
            authorizations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn remember_auth(&self, headers: &HeaderMap) -> bool {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.authorizations.lock().unwrap().push(auth);
        !self.reject_auth
    }
}

async fn upload(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if !api.remember_auth(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    api.uploads
        .lock()
        .unwrap()
        .push(String::from_utf8_lossy(&body).into_owned());
    Ok(Json(json!({ "id": 11 })))
}

async fn create_check(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !api.remember_auth(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    api.checks.lock().unwrap().push(request);
    Ok(Json(json!({ "id": 22 })))
}

async fn get_check(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    if !api.remember_auth(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let body = match api.script {
        CheckScript::Done => json!({
            "id": id,
            "status": "done",
            "progress": 100.0,
            "report": {
                "similarity": 12.5,
                "view_url": format!("https://uwrite.test/view/{}", id),
                "view_edit_url": format!("https://uwrite.test/view/{}/edit", id)
            }
        }),
        CheckScript::Failed => json!({
            "id": id,
            "status": "failed",
            "error": "unreadable document"
        }),
        CheckScript::Running => json!({
            "id": id,
            "status": "in_progress",
            "progress": 40.0
        }),
    };
    Ok(Json(body))
}

/// Serve `api` on an ephemeral port and return a client configured for it
async fn start_fake(api: FakeApi, config: UwriteConfig) -> UwriteClient {
    let app = Router::new()
        .route("/files", post(upload))
        .route("/checks", post(create_check))
        .route("/checks/:id", get(get_check))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = UwriteConfig {
        base_url: format!("http://{}/", addr),
        ..config
    };
    UwriteClient::new(&config).unwrap()
}

fn client_config() -> UwriteConfig {
    UwriteConfig {
        key: Some("key-1".to_string()),
        secret: Some("secret-1".to_string()),
        poll_interval_ms: 10,
        check_timeout_secs: 5,
        status_requests_per_second: 100,
        ..UwriteConfig::default()
    }
}

async fn essay_stream() -> uwrite_review::models::ContentStream {
    MemoryResource::new(
        "/attachment/essay.txt",
        b"It was a dark and stormy night.".to_vec(),
        "text/plain",
        Some("essay.txt"),
    )
    .stream_content()
    .await
    .unwrap()
}

#[tokio::test]
async fn test_upload_check_and_poll() {
    let api = FakeApi::new(CheckScript::Done);
    let client = start_fake(api.clone(), client_config()).await;

    let file = client.upload_file(essay_stream().await, "txt", "essay").await.unwrap();
    assert_eq!(file.id, 11);

    let check = client
        .create_check(file.id, CheckType::Web, true, false)
        .await
        .unwrap();
    assert_eq!(check.id, 22);

    let report = client.wait_for_check(check.id).await.unwrap();
    assert_eq!(report.similarity, 12.5);
    assert_eq!(report.view_url, "https://uwrite.test/view/22");
    assert_eq!(report.view_edit_url.as_deref(), Some("https://uwrite.test/view/22/edit"));

    let upload_body = api.uploads.lock().unwrap()[0].clone();
    assert!(upload_body.contains("It was a dark and stormy night."));
    assert!(upload_body.contains("filename=\"essay.txt\""));
    assert!(upload_body.contains("name=\"file_type\""));

    let request = api.checks.lock().unwrap()[0].clone();
    assert_eq!(
        request,
        json!({
            "file_id": 11,
            "type": "web",
            "exclude_citations": true,
            "exclude_references": false
        })
    );

    // Every call carries HTTP basic credentials
    let auths = api.authorizations.lock().unwrap().clone();
    assert_eq!(auths.len(), 3);
    assert!(auths.iter().all(|a| a.starts_with("Basic ")));
}

#[tokio::test]
async fn test_failed_check() {
    let client = start_fake(FakeApi::new(CheckScript::Failed), client_config()).await;

    match client.wait_for_check(5).await {
        Err(UwriteError::CheckFailed { check_id, message }) => {
            assert_eq!(check_id, 5);
            assert_eq!(message, "unreadable document");
        }
        other => panic!("expected CheckFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_timeout() {
    let config = UwriteConfig {
        check_timeout_secs: 0,
        ..client_config()
    };
    let client = start_fake(FakeApi::new(CheckScript::Running), config).await;

    assert!(matches!(
        client.wait_for_check(9).await,
        Err(UwriteError::Timeout { check_id: 9, .. })
    ));
}

#[tokio::test]
async fn test_rejected_credentials() {
    let api = FakeApi {
        reject_auth: true,
        ..FakeApi::new(CheckScript::Done)
    };
    let client = start_fake(api, client_config()).await;

    assert!(matches!(
        client.upload_file(essay_stream().await, "txt", "essay").await,
        Err(UwriteError::InvalidCredentials)
    ));
    assert!(matches!(
        client.create_check(1, CheckType::Combined, true, true).await,
        Err(UwriteError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = UwriteConfig {
        base_url: format!("http://{}", addr),
        ..client_config()
    };
    let client = UwriteClient::new(&config).unwrap();

    assert!(matches!(
        client.create_check(1, CheckType::Web, true, true).await,
        Err(UwriteError::NetworkError(_))
    ));
}
