//! Review endpoints
//!
//! Content ids are opaque host paths ("/attachment/..."), so they travel as
//! query parameters rather than path segments.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::{ContentResource, FileResource, ReviewStatus};
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One file to review, relative to the service root folder
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitItem {
    pub content_id: String,
    pub path: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitRequest {
    pub user_id: String,
    pub site_id: String,
    pub assignment_ref: String,
    pub items: Vec<SubmitItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub queued: usize,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub content_id: String,
}

/// Who is asking for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportRole {
    #[default]
    Student,
    Instructor,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub content_id: String,
    pub user_id: String,
    #[serde(default)]
    pub role: ReportRole,
}

#[derive(Debug, Deserialize)]
pub struct IconQuery {
    pub score: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub content_id: String,
    pub status: ReviewStatus,
    pub code: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub content_id: String,
    pub score: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub content_id: String,
    pub link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub content_id: String,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IconResponse {
    pub score: i64,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedTypesResponse {
    pub service_name: String,
    pub allow_all_content: bool,
    pub allow_resubmission: bool,
    pub extensions_to_mime_types: BTreeMap<String, BTreeSet<String>>,
    pub file_types_to_extensions: BTreeMap<String, BTreeSet<String>>,
}

/// Resolve a submitted path under the root folder, refusing escapes
fn resolve_submission_path(root: &Path, relative: &str) -> ApiResult<PathBuf> {
    let path = Path::new(relative);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if relative.trim().is_empty() || escapes {
        return Err(ApiError::BadRequest(format!(
            "Path must be relative to the root folder: {}",
            relative
        )));
    }

    Ok(root.join(path))
}

/// POST /reviews
pub async fn submit_reviews(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let mut resources: Vec<Arc<dyn ContentResource>> = Vec::with_capacity(request.items.len());

    for item in &request.items {
        let path = resolve_submission_path(&state.root_folder, &item.path)?;
        let content_type = item.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);

        let resource = FileResource::open(&item.content_id, &path, content_type, item.display_name.as_deref())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Cannot read {}: {}", item.content_id, e)))?;
        resources.push(Arc::new(resource));
    }

    let queued = resources.len();
    if let Err(e) = state
        .service
        .submit(&request.user_id, &request.site_id, &request.assignment_ref, resources)
        .await
    {
        state.record_error(e.to_string()).await;
        return Err(e.into());
    }

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { queued })))
}

/// GET /reviews/status
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let status = state.service.get_status(&query.content_id).await?;
    Ok(Json(StatusResponse {
        content_id: query.content_id,
        status,
        code: status.code(),
    }))
}

/// GET /reviews/score
pub async fn get_score(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<ScoreResponse>> {
    let score = state.service.get_score(&query.content_id).await?;
    Ok(Json(ScoreResponse {
        content_id: query.content_id,
        score,
    }))
}

/// GET /reviews/report
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<ReportResponse>> {
    let link = match query.role {
        ReportRole::Student => {
            state
                .service
                .get_review_report_student(&query.content_id, &query.user_id)
                .await?
        }
        ReportRole::Instructor => {
            state
                .service
                .get_review_report_instructor(&query.content_id, &query.user_id)
                .await?
        }
    };

    Ok(Json(ReportResponse {
        content_id: query.content_id,
        link,
    }))
}

/// GET /reviews/error
pub async fn get_error(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<ErrorResponse>> {
    let error = state.service.get_error(&query.content_id).await?;
    Ok(Json(ErrorResponse {
        content_id: query.content_id,
        error,
    }))
}

/// GET /reviews/accepted-types
pub async fn get_accepted_types(State(state): State<AppState>) -> Json<AcceptedTypesResponse> {
    let service = &state.service;
    Json(AcceptedTypesResponse {
        service_name: service.service_name().to_string(),
        allow_all_content: service.allow_all_content(),
        allow_resubmission: service.allow_resubmission(),
        extensions_to_mime_types: service.acceptable_extensions_to_mime_types().clone(),
        file_types_to_extensions: service.acceptable_file_types_to_extensions().clone(),
    })
}

/// GET /reviews/icon
pub async fn get_icon(
    State(state): State<AppState>,
    Query(query): Query<IconQuery>,
) -> Json<IconResponse> {
    Json(IconResponse {
        score: query.score,
        url: state.service.icon_url_for_score(query.score),
    })
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(submit_reviews))
        .route("/reviews/status", get(get_status))
        .route("/reviews/score", get(get_score))
        .route("/reviews/report", get(get_report))
        .route("/reviews/error", get(get_error))
        .route("/reviews/accepted-types", get(get_accepted_types))
        .route("/reviews/icon", get(get_icon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_submission_path() {
        let root = Path::new("/srv/uwrite");
        assert_eq!(
            resolve_submission_path(root, "site-1/essay.docx").unwrap(),
            PathBuf::from("/srv/uwrite/site-1/essay.docx")
        );
        assert!(resolve_submission_path(root, "../etc/passwd").is_err());
        assert!(resolve_submission_path(root, "/etc/passwd").is_err());
        assert!(resolve_submission_path(root, "").is_err());
    }
}
