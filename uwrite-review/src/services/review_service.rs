//! Content review service
//!
//! The host-facing surface: submission goes to the dispatcher, every query
//! is answered from the result store alone.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::UwriteConfig;
use crate::db::ReviewItemStore;
use crate::error::{ReviewError, ReviewResult};
use crate::models::{
    AcceptedFileTypes, ContentResource, ReviewItem, ReviewStatus, ScoreIcon, SCORE_IN_PROGRESS,
};
use crate::services::dispatcher::{DispatchSettings, SubmissionDispatcher};
use crate::services::locale::{inject_language, LocaleResolver};
use crate::services::uwrite_client::CheckClient;

pub const SERVICE_NAME: &str = "Uwrite";

/// Uwrite-backed content review service
#[derive(Clone)]
pub struct ContentReviewService {
    store: Arc<dyn ReviewItemStore>,
    dispatcher: SubmissionDispatcher,
    locales: Arc<dyn LocaleResolver>,
    accepted_types: Arc<AcceptedFileTypes>,
    allow_any_file_type: bool,
    max_file_size: u64,
    default_locale: String,
    icon_base_path: String,
}

impl std::fmt::Debug for ContentReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentReviewService")
            .field("dispatcher", &self.dispatcher)
            .field("allow_any_file_type", &self.allow_any_file_type)
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}

impl ContentReviewService {
    /// Build the service and start its worker pool
    pub fn new(
        config: &UwriteConfig,
        store: Arc<dyn ReviewItemStore>,
        client: Arc<dyn CheckClient>,
        locales: Arc<dyn LocaleResolver>,
    ) -> Self {
        let accepted_types = Arc::new(AcceptedFileTypes::default());
        let dispatcher = SubmissionDispatcher::new(
            DispatchSettings::from(config),
            Arc::clone(&store),
            client,
            Arc::clone(&accepted_types),
        );

        Self {
            store,
            dispatcher,
            locales,
            accepted_types,
            allow_any_file_type: config.allow_any_file_type,
            max_file_size: config.max_file_size,
            default_locale: config.default_locale.clone(),
            icon_base_path: config.icon_base_path.clone(),
        }
    }

    pub fn dispatcher(&self) -> &SubmissionDispatcher {
        &self.dispatcher
    }

    /// Queue resources for review (see [`SubmissionDispatcher::submit`])
    pub async fn submit(
        &self,
        user_id: &str,
        site_id: &str,
        assignment_ref: &str,
        items: Vec<Arc<dyn ContentResource>>,
    ) -> ReviewResult<()> {
        self.dispatcher
            .submit(user_id, site_id, assignment_ref, items)
            .await
    }

    /// Stop accepting submissions and drain in-flight reviews
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }

    async fn find(&self, content_id: &str) -> ReviewResult<Option<ReviewItem>> {
        Ok(self.store.find_by_content_id(content_id).await?)
    }

    async fn find_existing(&self, content_id: &str) -> ReviewResult<ReviewItem> {
        self.find(content_id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(content_id.to_string()))
    }

    pub async fn get_status(&self, content_id: &str) -> ReviewResult<ReviewStatus> {
        let item = self.find(content_id).await?;
        Ok(ReviewStatus::from_item(item.as_ref()))
    }

    /// Stored score, or [`SCORE_IN_PROGRESS`] until a report link exists
    pub async fn get_score(&self, content_id: &str) -> ReviewResult<i32> {
        let item = self.find_existing(content_id).await?;
        match (&item.link, item.score) {
            (Some(_), Some(score)) => Ok(score),
            _ => Ok(SCORE_IN_PROGRESS),
        }
    }

    pub async fn get_error(&self, content_id: &str) -> ReviewResult<Option<String>> {
        Ok(self.find_existing(content_id).await?.error)
    }

    /// Report link for `content_id`, localized for `user_id`
    ///
    /// `None` when nothing was submitted or the report is not ready yet.
    pub async fn get_report_link(
        &self,
        content_id: &str,
        user_id: &str,
        editable: bool,
    ) -> ReviewResult<Option<String>> {
        let Some(item) = self.find(content_id).await? else {
            return Ok(None);
        };

        if let Some(error) = item.error {
            return Err(ReviewError::Report(error));
        }

        let link = if editable { item.edit_link } else { item.link };
        match link {
            Some(link) => {
                let locale = self.report_locale(user_id).await;
                Ok(Some(inject_language(&link, &locale)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_review_report(&self, content_id: &str, user_id: &str) -> ReviewResult<Option<String>> {
        self.get_report_link(content_id, user_id, false).await
    }

    pub async fn get_review_report_student(
        &self,
        content_id: &str,
        user_id: &str,
    ) -> ReviewResult<Option<String>> {
        self.get_report_link(content_id, user_id, false).await
    }

    pub async fn get_review_report_instructor(
        &self,
        content_id: &str,
        user_id: &str,
    ) -> ReviewResult<Option<String>> {
        self.get_report_link(content_id, user_id, true).await
    }

    async fn report_locale(&self, user_id: &str) -> String {
        match self.locales.preferred_locale(user_id).await {
            Ok(Some(locale)) => locale,
            Ok(None) => self.default_locale.clone(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load locale preference");
                self.default_locale.clone()
            }
        }
    }

    pub fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    pub fn allow_all_content(&self) -> bool {
        self.allow_any_file_type
    }

    pub fn allow_resubmission(&self) -> bool {
        true
    }

    /// Every site may use the service
    pub fn is_site_acceptable(&self, _site_id: &str) -> bool {
        true
    }

    pub fn is_acceptable_content(&self, resource: &dyn ContentResource) -> bool {
        self.allow_any_file_type || self.accepted_types.is_eligible(resource, self.max_file_size)
    }

    pub fn acceptable_extensions_to_mime_types(&self) -> &BTreeMap<String, BTreeSet<String>> {
        self.accepted_types.extensions_to_mime_types()
    }

    pub fn acceptable_file_types_to_extensions(&self) -> &BTreeMap<String, BTreeSet<String>> {
        self.accepted_types.file_types_to_extensions()
    }

    pub fn icon_url_for_score(&self, score: i64) -> String {
        ScoreIcon::for_score(score).url(&self.icon_base_path)
    }
}
