//! Submission dispatcher
//!
//! For each submitted resource a pending record is saved before `submit`
//! returns, then one unit of work is spawned: eligibility check, upload,
//! create check, wait for the report, write the terminal record.
//!
//! Units run as tokio tasks gated by a semaphore with `pool_size` permits,
//! so at most `pool_size` checks are in flight. Every failure inside a unit,
//! panics included, ends up in the record's `error` field.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::task::TaskTracker;

use crate::config::UwriteConfig;
use crate::db::ReviewItemStore;
use crate::error::{ReviewError, ReviewResult};
use crate::models::resource::{base_name, file_extension};
use crate::models::review_item::score_from_similarity;
use crate::models::{AcceptedFileTypes, ContentResource, ReviewItem, UNSUPPORTED_FILE_ERROR};
use crate::services::uwrite_client::{CheckClient, CheckReport, CheckType, UwriteError};

/// Options the units of work need from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub pool_size: usize,
    pub check_type: CheckType,
    pub max_file_size: u64,
    pub allow_any_file_type: bool,
    pub exclude_citations: bool,
    pub exclude_references: bool,
}

impl From<&UwriteConfig> for DispatchSettings {
    fn from(config: &UwriteConfig) -> Self {
        Self {
            pool_size: config.pool_size.max(1),
            check_type: config.check_type,
            max_file_size: config.max_file_size,
            allow_any_file_type: config.allow_any_file_type,
            exclude_citations: config.exclude_citations,
            exclude_references: config.exclude_references,
        }
    }
}

/// Shared, read-only state of every unit of work
struct WorkerContext {
    store: Arc<dyn ReviewItemStore>,
    client: Arc<dyn CheckClient>,
    accepted_types: Arc<AcceptedFileTypes>,
    settings: DispatchSettings,
    permits: Arc<Semaphore>,
}

/// Bounded pool of review units
#[derive(Clone)]
pub struct SubmissionDispatcher {
    context: Arc<WorkerContext>,
    tracker: TaskTracker,
    /// Held shared by `submit` for its whole batch, exclusively by
    /// `shutdown` while it closes the tracker
    admission: Arc<RwLock<()>>,
}

impl std::fmt::Debug for SubmissionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionDispatcher")
            .field("settings", &self.context.settings)
            .field("in_flight", &self.tracker.len())
            .field("closed", &self.tracker.is_closed())
            .finish()
    }
}

impl SubmissionDispatcher {
    pub fn new(
        settings: DispatchSettings,
        store: Arc<dyn ReviewItemStore>,
        client: Arc<dyn CheckClient>,
        accepted_types: Arc<AcceptedFileTypes>,
    ) -> Self {
        let pool_size = settings.pool_size.max(1);
        tracing::info!(pool_size, check_type = %settings.check_type, "Submission dispatcher started");

        Self {
            context: Arc::new(WorkerContext {
                store,
                client,
                accepted_types,
                settings,
                permits: Arc::new(Semaphore::new(pool_size)),
            }),
            tracker: TaskTracker::new(),
            admission: Arc::new(RwLock::new(())),
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.context.settings
    }

    /// Units of work spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Save a pending record per resource and schedule its review
    ///
    /// Records are created in `items` order before this returns. Fails with
    /// `ReviewError::Queue` when the dispatcher is shut down, a resource has
    /// no content id, or a pending record cannot be saved; resources queued
    /// before the failing one stay queued. A batch that got past the
    /// shutdown check is fully spawned before `shutdown` starts draining.
    pub async fn submit(
        &self,
        user_id: &str,
        site_id: &str,
        assignment_ref: &str,
        items: Vec<Arc<dyn ContentResource>>,
    ) -> ReviewResult<()> {
        let _admission = self.admission.read().await;
        if self.tracker.is_closed() {
            return Err(ReviewError::Queue(
                "Submission dispatcher is shut down".to_string(),
            ));
        }

        if items.iter().any(|resource| resource.id().trim().is_empty()) {
            return Err(ReviewError::Queue(
                "Resource without a content id cannot be queued".to_string(),
            ));
        }

        tracing::info!(user_id, site_id, assignment_ref, count = items.len(), "Queueing content");

        for resource in items {
            let item = ReviewItem::pending(resource.id(), user_id, site_id, assignment_ref);

            self.context.store.save(&item).await.map_err(|e| {
                ReviewError::Queue(format!("Failed to queue {}: {}", item.content_id, e))
            })?;

            let context = Arc::clone(&self.context);
            self.tracker.spawn(run_unit(context, resource, item));
        }

        Ok(())
    }

    /// Stop accepting work and wait for in-flight units to finish
    pub async fn shutdown(&self) {
        {
            let _admission = self.admission.write().await;
            self.tracker.close();
        }
        tracing::info!(in_flight = self.tracker.len(), "Draining submission dispatcher");
        self.tracker.wait().await;
        tracing::info!("Submission dispatcher drained");
    }
}

/// One resource, start to terminal record
async fn run_unit(context: Arc<WorkerContext>, resource: Arc<dyn ContentResource>, mut item: ReviewItem) {
    let content_id = item.content_id.clone();
    tracing::info!(content_id = %content_id, "Processing resource");

    let eligibility = if context.settings.allow_any_file_type {
        Ok(())
    } else {
        context
            .accepted_types
            .check(resource.as_ref(), context.settings.max_file_size)
    };

    if let Err(reason) = eligibility {
        tracing::info!(content_id = %content_id, ?reason, "Unsupported file, not submitted");
        item.fail(UNSUPPORTED_FILE_ERROR);
    } else {
        // Semaphore is never closed
        let _permit = match Arc::clone(&context.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                item.fail(format!("Worker pool unavailable: {}", e));
                persist(&context, &item).await;
                return;
            }
        };

        let outcome = AssertUnwindSafe(check_resource(&context, resource.as_ref()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(report)) => {
                let score = score_from_similarity(report.similarity);
                tracing::info!(content_id = %content_id, similarity = report.similarity, score, "Check complete");
                item.succeed(score, report.view_url, report.view_edit_url);
            }
            Ok(Err(e)) => {
                tracing::error!(content_id = %content_id, error = %e, "Check failed");
                item.fail(e.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(content_id = %content_id, panic = %message, "Review task panicked");
                item.fail(format!("Review task panicked: {}", message));
            }
        }
    }

    persist(&context, &item).await;
    tracing::info!("{} is completed", content_id);
}

/// Upload → create check → wait; the content stream is consumed by the
/// upload and closed before this returns, whatever the outcome
async fn check_resource(
    context: &WorkerContext,
    resource: &dyn ContentResource,
) -> Result<CheckReport, UwriteError> {
    let display_name = resource.display_name().unwrap_or_else(|| resource.id());
    let extension = file_extension(resource.id())
        .or_else(|| file_extension(display_name))
        .unwrap_or_default();

    let content = resource.stream_content().await?;
    let uploaded = context
        .client
        .upload_file(content, &extension, base_name(display_name))
        .await?;

    let settings = &context.settings;
    let check = context
        .client
        .create_check(
            uploaded.id,
            settings.check_type,
            settings.exclude_citations,
            settings.exclude_references,
        )
        .await?;

    tracing::debug!(content_id = resource.id(), file_id = uploaded.id, check_id = check.id, "Waiting for check");

    context.client.wait_for_check(check.id).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn persist(context: &WorkerContext, item: &ReviewItem) {
    if let Err(e) = context.store.save(item).await {
        tracing::error!(content_id = %item.content_id, error = %e, "Failed to save review result");
    }
}
