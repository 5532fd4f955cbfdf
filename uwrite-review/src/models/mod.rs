//! Data models for the review service

pub mod accepted_types;
pub mod resource;
pub mod review_item;
pub mod review_status;

pub use accepted_types::{AcceptedFileTypes, Ineligible, DEFAULT_MAX_FILE_SIZE};
pub use resource::{ContentResource, ContentStream, FileResource, MemoryResource};
pub use review_item::{ReviewItem, ReviewState, SCORE_IN_PROGRESS, UNSUPPORTED_FILE_ERROR};
pub use review_status::{ReviewStatus, ScoreIcon};
