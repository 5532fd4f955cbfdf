//! Review record model
//!
//! One record per submitted content item. The record moves from pending to
//! exactly one terminal state (succeeded or failed); only a fresh submission
//! for the same content id resets it.

use serde::{Deserialize, Serialize};

/// Score returned while a check has not produced a report yet
pub const SCORE_IN_PROGRESS: i32 = -1;

/// Error stored for resources rejected by the eligibility check
pub const UNSUPPORTED_FILE_ERROR: &str = "Unsupported file";

/// Persisted review state for one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Store-assigned row id (None until first saved)
    pub id: Option<i64>,
    pub content_id: String,
    pub site_id: String,
    pub assignment_ref: String,
    pub user_id: String,
    /// Viewer URL, set on success
    pub link: Option<String>,
    /// Editable viewer URL, set on success
    pub edit_link: Option<String>,
    /// 0-100, derived from `100 - similarity`
    pub score: Option<i32>,
    /// Failure message; presence marks the record as failed
    pub error: Option<String>,
}

/// The three mutually exclusive states of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    Succeeded,
    Failed,
}

impl ReviewItem {
    /// Create a pending record for a freshly accepted submission
    pub fn pending(content_id: &str, user_id: &str, site_id: &str, assignment_ref: &str) -> Self {
        Self {
            id: None,
            content_id: content_id.to_string(),
            site_id: site_id.to_string(),
            assignment_ref: assignment_ref.to_string(),
            user_id: user_id.to_string(),
            link: None,
            edit_link: None,
            score: None,
            error: None,
        }
    }

    pub fn state(&self) -> ReviewState {
        if self.link.is_some() {
            ReviewState::Succeeded
        } else if self.error.is_some() {
            ReviewState::Failed
        } else {
            ReviewState::Pending
        }
    }

    /// Terminal success: score and both links written together
    pub fn succeed(&mut self, score: i32, link: String, edit_link: Option<String>) {
        self.score = Some(score);
        self.link = Some(link);
        self.edit_link = edit_link;
        self.error = None;
    }

    /// Terminal failure: success fields stay unset
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.score = None;
        self.link = None;
        self.edit_link = None;
    }
}

/// Convert a remote similarity percentage into a review score
pub fn score_from_similarity(similarity: f32) -> i32 {
    let score = (100.0 - similarity).round();
    score.clamp(0.0, 100.0) as i32
}
