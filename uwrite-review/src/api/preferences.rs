//! User preference endpoints

use axum::{extract::State, routing::put, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalePreference {
    pub user_id: String,
    pub locale: String,
}

/// PUT /preferences/locale
pub async fn set_locale(
    State(state): State<AppState>,
    Json(request): Json<LocalePreference>,
) -> ApiResult<Json<LocalePreference>> {
    if request.user_id.trim().is_empty() || request.locale.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "user_id and locale must not be empty".to_string(),
        ));
    }

    crate::db::preferences::set_user_locale(&state.db, &request.user_id, &request.locale).await?;
    tracing::info!(user_id = %request.user_id, locale = %request.locale, "Locale preference saved");

    Ok(Json(request))
}

pub fn preference_routes() -> Router<AppState> {
    Router::new().route("/preferences/locale", put(set_locale))
}
