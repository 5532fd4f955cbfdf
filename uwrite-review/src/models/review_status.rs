//! Status codes and score icons reported to the host

use serde::{Deserialize, Serialize};

use super::review_item::ReviewItem;

/// Review status as seen by the host application
///
/// Numeric codes match the host's content-review status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    NotSubmitted,
    AwaitingReport,
    ReportAvailable,
    ErrorRetry,
}

impl ReviewStatus {
    /// Derive the status from a (possibly absent) record
    ///
    /// Pure function of link and error presence; a link wins over an error.
    pub fn from_item(item: Option<&ReviewItem>) -> Self {
        match item {
            None => ReviewStatus::NotSubmitted,
            Some(item) if item.link.is_some() => ReviewStatus::ReportAvailable,
            Some(item) if item.error.is_some() => ReviewStatus::ErrorRetry,
            Some(_) => ReviewStatus::AwaitingReport,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ReviewStatus::NotSubmitted => 1,
            ReviewStatus::AwaitingReport => 2,
            ReviewStatus::ReportAvailable => 3,
            ReviewStatus::ErrorRetry => 4,
        }
    }
}

/// Display asset for a score range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreIcon {
    Pass,
    Warning,
    Fail,
    InProgress,
}

impl ScoreIcon {
    pub fn for_score(score: i64) -> Self {
        if score > 80 {
            ScoreIcon::Pass
        } else if score > 40 {
            ScoreIcon::Warning
        } else if score >= 0 {
            ScoreIcon::Fail
        } else {
            ScoreIcon::InProgress
        }
    }

    pub fn asset_name(self) -> &'static str {
        match self {
            ScoreIcon::Pass => "green.gif",
            ScoreIcon::Warning => "yellow.gif",
            ScoreIcon::Fail => "red.gif",
            ScoreIcon::InProgress => "working.gif",
        }
    }

    /// Asset URL under `base_path` (trailing slash tolerated)
    pub fn url(self, base_path: &str) -> String {
        format!("{}/{}", base_path.trim_end_matches('/'), self.asset_name())
    }
}
