//! Random background image selection.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::AppState;

#[derive(Debug, Deserialize)]
pub struct BackgroundsQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct BackgroundsResponse {
    pub urls: Vec<String>,
}

/// GET /backgrounds?count=n
///
/// An empty candidate pool surfaces as 404, not an empty list.
pub async fn pick_backgrounds(
    State(state): State<AppState>,
    Query(query): Query<BackgroundsQuery>,
) -> ApiResult<Json<BackgroundsResponse>> {
    let urls = state.picker.pick_random(query.count).await?;
    Ok(Json(BackgroundsResponse { urls }))
}
