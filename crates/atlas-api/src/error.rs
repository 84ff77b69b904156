//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use atlas_content::ContentError;
use atlas_core::ValidationErrors;
use atlas_db::RepositoryError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: String, id: String },
    Validation(ValidationErrors),
    Referential { field: String },
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    RemoteStore(String),
    NoContent,
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Referential { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RemoteStore(_) => StatusCode::BAD_GATEWAY,
            ApiError::NoContent => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::NotFound { resource, id } => ErrorBody {
                error: "NotFound".into(),
                message: format!("{} with id {} not found", resource, id),
                field: None,
            },
            ApiError::Validation(errors) => ErrorBody {
                error: "Validation".into(),
                message: errors.full_messages().join(", "),
                field: None,
            },
            ApiError::Referential { field } => ErrorBody {
                error: "Referential".into(),
                message: format!("Related entity does not exist: {}", field),
                field: Some(field.clone()),
            },
            ApiError::Unauthorized(msg) => ErrorBody {
                error: "Unauthorized".into(),
                message: msg.clone(),
                field: None,
            },
            ApiError::Forbidden(msg) => ErrorBody {
                error: "Forbidden".into(),
                message: msg.clone(),
                field: None,
            },
            ApiError::BadRequest(msg) => ErrorBody {
                error: "BadRequest".into(),
                message: msg.clone(),
                field: None,
            },
            ApiError::Conflict(msg) => ErrorBody {
                error: "Conflict".into(),
                message: msg.clone(),
                field: None,
            },
            ApiError::RemoteStore(detail) => {
                // Server errors keep the detail out of the response body
                error!(detail, "Remote store failure");
                ErrorBody {
                    error: "RemoteStore".into(),
                    message: "Upstream storage is unavailable".into(),
                    field: None,
                }
            }
            ApiError::NoContent => ErrorBody {
                error: "NoContent".into(),
                message: "No content available".into(),
                field: None,
            },
            ApiError::Internal(detail) => {
                error!(detail, "Internal error");
                ErrorBody {
                    error: "Internal".into(),
                    message: "An internal error occurred".into(),
                    field: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(errors) => ApiError::Validation(errors),
            ContentError::NotFound { kind, id } => {
                ApiError::not_found(kind.as_str().to_string(), id)
            }
            ContentError::Referential { field } => ApiError::Referential { field },
            ContentError::RemoteStore(e) => ApiError::RemoteStore(e.to_string()),
            ContentError::Ledger(e) => ApiError::Internal(e.to_string()),
            ContentError::Repository(msg) => ApiError::Internal(msg),
            ContentError::NoContent => ApiError::NoContent,
            ContentError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => ApiError::not_found(what, "?"),
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            RepositoryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::ContentKind;

    #[test]
    fn test_content_error_status_mapping() {
        let cases: Vec<(ContentError, StatusCode)> = vec![
            (
                ContentError::NotFound {
                    kind: ContentKind::Unit,
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ContentError::Referential {
                    field: "classIds".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ContentError::NoContent, StatusCode::NOT_FOUND),
            (
                ContentError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_validation_maps_to_422() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "can't be blank");
        let api: ApiError = ContentError::Validation(errors).into();
        assert_eq!(api.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_remote_store_maps_to_502() {
        let api: ApiError =
            ContentError::RemoteStore(atlas_assets::StoreError::BackendError("down".into())).into();
        assert_eq!(api.status_code(), StatusCode::BAD_GATEWAY);
    }
}
