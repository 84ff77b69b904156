//! Content CRUD handlers for the three entity kinds.
//!
//! Reads are public; mutations require an editor. Every mutation arrives
//! as multipart and goes through [`ContentForm`] before reaching the
//! coordinator.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use atlas_content::{ContentCoordinator, ContentView};
use atlas_core::{Id, PostKind};

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser, EditorUser};
use crate::multipart::ContentForm;

async fn list(coordinator: &ContentCoordinator) -> ApiResult<Json<Vec<ContentView>>> {
    Ok(Json(coordinator.list().await?))
}

async fn get(coordinator: &ContentCoordinator, id: Id) -> ApiResult<Json<ContentView>> {
    Ok(Json(coordinator.get(id).await?))
}

async fn create(
    coordinator: &ContentCoordinator,
    caller_id: Id,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = ContentForm::collect(multipart).await?;
    let (input, attachments) = form.into_new_content()?;
    let view = coordinator.create(input, attachments, Some(caller_id)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update(
    coordinator: &ContentCoordinator,
    id: Id,
    multipart: Multipart,
) -> ApiResult<Json<ContentView>> {
    let form = ContentForm::collect(multipart).await?;
    let (patch, attachments, gallery_deletes) = form.into_patch()?;
    let view = coordinator
        .update(id, patch, attachments, &gallery_deletes)
        .await?;
    Ok(Json(view))
}

async fn remove(coordinator: &ContentCoordinator, id: Id) -> ApiResult<StatusCode> {
    coordinator.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Classes

/// GET /classes
pub async fn list_classes(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    list(&state.classes).await
}

/// GET /classes/:id
pub async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    get(&state.classes, id).await
}

/// POST /classes
pub async fn create_class(
    State(state): State<AppState>,
    user: EditorUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    create(&state.classes, user.id, multipart).await
}

/// PUT /classes/:id
pub async fn update_class(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    update(&state.classes, id, multipart).await
}

/// DELETE /classes/:id
pub async fn delete_class(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    remove(&state.classes, id).await
}

// Units

/// GET /units
pub async fn list_units(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    list(&state.units).await
}

/// GET /units/mine
pub async fn my_units(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.units.list_owned(user.id).await?))
}

/// GET /units/by-class/:id
pub async fn units_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    related(&state.units, &state.classes, class_id).await
}

async fn related(
    coordinator: &Arc<ContentCoordinator>,
    source: &Arc<ContentCoordinator>,
    source_id: Id,
) -> ApiResult<Json<Vec<ContentView>>> {
    let views = coordinator
        .list_related(source.config().kind, source_id)
        .await?;
    Ok(Json(views))
}

/// GET /units/:id
pub async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    get(&state.units, id).await
}

/// POST /units
pub async fn create_unit(
    State(state): State<AppState>,
    user: EditorUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    create(&state.units, user.id, multipart).await
}

/// PUT /units/:id
pub async fn update_unit(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    update(&state.units, id, multipart).await
}

/// DELETE /units/:id
pub async fn delete_unit(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    remove(&state.units, id).await
}

// Posts

/// GET /posts
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    list(&state.posts).await
}

/// GET /posts/regions
pub async fn region_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.posts.list_by_post_kind(PostKind::Region).await?))
}

/// GET /posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    get(&state.posts, id).await
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    user: EditorUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    create(&state.posts, user.id, multipart).await
}

/// PUT /posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    update(&state.posts, id, multipart).await
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    _user: EditorUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    remove(&state.posts, id).await
}
