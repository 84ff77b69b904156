//! Standalone gallery-asset deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use atlas_content::delete_asset;
use atlas_core::Id;

use crate::error::ApiResult;
use crate::extractors::{AppState, EditorUser};

/// DELETE /uploads/:id
///
/// Same sequence the coordinator uses internally: resolve the ledger
/// row, best-effort remote delete, then drop the row. Unknown ids are a
/// no-op.
pub async fn delete_upload(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    delete_asset(&*state.ledger, &*state.objects, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
