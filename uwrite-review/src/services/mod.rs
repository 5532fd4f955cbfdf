//! Review services: remote client, dispatcher, query surface

pub mod dispatcher;
pub mod locale;
pub mod review_service;
pub mod uwrite_client;

pub use dispatcher::{DispatchSettings, SubmissionDispatcher};
pub use locale::{LocaleResolver, NoPreferences};
pub use review_service::{ContentReviewService, SERVICE_NAME};
pub use uwrite_client::{
    CheckClient, CheckHandle, CheckReport, CheckType, UploadedFile, UwriteClient, UwriteError,
};
