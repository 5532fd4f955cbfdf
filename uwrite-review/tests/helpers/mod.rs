//! Test Helper Utilities
//!
//! Shared utilities for testing uwrite-review: a scriptable in-process
//! check client and service/state builders on an in-memory database.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::Semaphore;
use uwrite_review::config::UwriteConfig;
use uwrite_review::db::{init_memory_pool, SqliteItemStore};
use uwrite_review::models::{ContentResource, ContentStream, MemoryResource};
use uwrite_review::services::{
    CheckClient, CheckHandle, CheckReport, CheckType, NoPreferences, UploadedFile, UwriteError,
};
use uwrite_review::ContentReviewService;

/// How the mock answers
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Succeed { similarity: f32 },
    FailUpload(String),
    FailCheck(String),
    /// upload_file panics with this message
    PanicUpload(&'static str),
}

/// Arguments of the last create_check call
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCheckCall {
    pub file_id: i64,
    pub check_type: CheckType,
    pub exclude_citations: bool,
    pub exclude_references: bool,
}

/// Scriptable CheckClient that records every call
pub struct MockCheckClient {
    behavior: MockBehavior,
    /// When set, wait_for_check blocks until a permit is added
    gate: Option<Arc<Semaphore>>,
    pub uploads: AtomicUsize,
    pub checks: AtomicUsize,
    pub waits: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub uploaded: Mutex<Vec<(String, String, usize)>>,
    pub last_create: Mutex<Option<CreateCheckCall>>,
}

impl MockCheckClient {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            gate: None,
            uploads: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
            waits: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
            last_create: Mutex::new(None),
        }
    }

    pub fn succeeding(similarity: f32) -> Self {
        Self::new(MockBehavior::Succeed { similarity })
    }

    /// Hold every wait_for_check until `gate` gets permits
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn remote_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
            + self.checks.load(Ordering::SeqCst)
            + self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckClient for MockCheckClient {
    async fn upload_file(
        &self,
        mut content: ContentStream,
        extension: &str,
        base_name: &str,
    ) -> Result<UploadedFile, UwriteError> {
        let id = self.uploads.fetch_add(1, Ordering::SeqCst) as i64 + 1;

        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes).await?;
        self.uploaded
            .lock()
            .unwrap()
            .push((extension.to_string(), base_name.to_string(), bytes.len()));

        match &self.behavior {
            MockBehavior::FailUpload(message) => Err(UwriteError::NetworkError(message.clone())),
            MockBehavior::PanicUpload(message) => panic!("{}", message),
            _ => Ok(UploadedFile { id }),
        }
    }

    async fn create_check(
        &self,
        file_id: i64,
        check_type: CheckType,
        exclude_citations: bool,
        exclude_references: bool,
    ) -> Result<CheckHandle, UwriteError> {
        let id = self.checks.fetch_add(1, Ordering::SeqCst) as i64 + 1000;
        *self.last_create.lock().unwrap() = Some(CreateCheckCall {
            file_id,
            check_type,
            exclude_citations,
            exclude_references,
        });
        Ok(CheckHandle { id })
    }

    async fn wait_for_check(&self, check_id: i64) -> Result<CheckReport, UwriteError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        tokio::time::sleep(Duration::from_millis(2)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Succeed { similarity } => Ok(CheckReport {
                similarity: *similarity,
                view_url: format!("https://uwrite.test/report/{}", check_id),
                view_edit_url: Some(format!("https://uwrite.test/report/{}/edit", check_id)),
            }),
            MockBehavior::FailCheck(message) => Err(UwriteError::CheckFailed {
                check_id,
                message: message.clone(),
            }),
            MockBehavior::FailUpload(_) | MockBehavior::PanicUpload(_) => {
                unreachable!("upload failed before the check")
            }
        }
    }
}

/// Config with credentials and the default pool size
pub fn test_config() -> UwriteConfig {
    UwriteConfig {
        key: Some("test-key".to_string()),
        secret: Some("test-secret".to_string()),
        ..UwriteConfig::default()
    }
}

/// Service on a fresh in-memory database
pub async fn create_test_service(
    config: &UwriteConfig,
    client: Arc<MockCheckClient>,
) -> (ContentReviewService, SqliteItemStore) {
    let pool = init_memory_pool().await.expect("Failed to create in-memory database");
    let store = SqliteItemStore::new(pool);
    let service = ContentReviewService::new(
        config,
        Arc::new(store.clone()),
        client,
        Arc::new(NoPreferences),
    );
    (service, store)
}

/// Eligible text resource
pub fn text_resource(content_id: &str) -> Arc<dyn ContentResource> {
    Arc::new(MemoryResource::new(
        content_id,
        b"The quick brown fox jumps over the lazy dog.".to_vec(),
        "text/plain",
        Some("essay.txt"),
    ))
}
