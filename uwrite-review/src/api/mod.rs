//! HTTP API handlers for uwrite-review
//!
//! JSON surface the host application calls: submit, poll status/score,
//! fetch report links and errors.

pub mod health;
pub mod preferences;
pub mod reviews;

pub use health::health_routes;
pub use preferences::preference_routes;
pub use reviews::review_routes;
