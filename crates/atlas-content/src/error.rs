//! Content lifecycle errors.

use atlas_core::{ContentKind, Id, ValidationErrors};
use thiserror::Error;

use atlas_assets::{LedgerError, StoreError};

use crate::store::ContentStoreError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{kind} {id} not found")]
    NotFound { kind: ContentKind, id: Id },

    #[error("Related entity does not exist: {field}")]
    Referential { field: String },

    #[error("Remote store failure: {0}")]
    RemoteStore(#[from] StoreError),

    #[error("Asset ledger failure: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Repository failure: {0}")]
    Repository(String),

    #[error("No content available")]
    NoContent,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ContentResult<T> = Result<T, ContentError>;

impl ContentError {
    pub fn not_found(kind: ContentKind, id: Id) -> Self {
        Self::NotFound { kind, id }
    }

    /// Whether the error is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::Referential { .. } | Self::NoContent
        )
    }
}

impl From<ContentStoreError> for ContentError {
    fn from(err: ContentStoreError) -> Self {
        match err {
            ContentStoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            ContentStoreError::Referential { field } => Self::Referential { field },
            ContentStoreError::Backend(msg) => Self::Repository(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: ContentError = ContentStoreError::Referential {
            field: "classIds".to_string(),
        }
        .into();
        assert!(matches!(err, ContentError::Referential { ref field } if field == "classIds"));
        assert!(err.is_client_error());

        let err: ContentError = ContentStoreError::Backend("pool closed".to_string()).into();
        assert!(!err.is_client_error());
    }
}
