//! Asset ledger backed by Postgres.

use async_trait::async_trait;
use atlas_core::{ContentKind, Id};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use atlas_assets::{AssetLedger, AssetSlot, LedgerError, LedgerResult, Upload};

/// Upload row from database
#[derive(Debug, Clone, FromRow)]
pub struct UploadRow {
    pub id: i64,
    pub path: String,
    pub slot: String,
    pub owner_kind: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl UploadRow {
    fn into_upload(self) -> LedgerResult<Upload> {
        let slot = AssetSlot::parse(&self.slot)
            .ok_or_else(|| LedgerError::BackendError(format!("unknown slot: {}", self.slot)))?;
        let owner_kind = ContentKind::parse(&self.owner_kind).ok_or_else(|| {
            LedgerError::BackendError(format!("unknown owner kind: {}", self.owner_kind))
        })?;

        Ok(Upload {
            id: Some(self.id),
            path: self.path,
            slot,
            owner_kind,
            owner_id: self.owner_id,
            created_at: self.created_at,
        })
    }
}

fn backend(err: sqlx::Error) -> LedgerError {
    LedgerError::BackendError(err.to_string())
}

/// Production asset ledger
pub struct PgAssetLedger {
    pool: PgPool,
}

impl PgAssetLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetLedger for PgAssetLedger {
    async fn record(&self, upload: &mut Upload) -> LedgerResult<Id> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO uploads (path, slot, owner_kind, owner_id, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id
            "#,
        )
        .bind(&upload.path)
        .bind(upload.slot.as_str())
        .bind(upload.owner_kind.as_str())
        .bind(upload.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        upload.id = Some(id);
        Ok(id)
    }

    async fn find(&self, id: Id) -> LedgerResult<Option<Upload>> {
        let row = sqlx::query_as::<_, UploadRow>(
            "SELECT id, path, slot, owner_kind, owner_id, created_at \
             FROM uploads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(UploadRow::into_upload).transpose()
    }

    async fn find_singleton(
        &self,
        owner_kind: ContentKind,
        owner_id: Id,
        slot: AssetSlot,
    ) -> LedgerResult<Option<Upload>> {
        let row = sqlx::query_as::<_, UploadRow>(
            "SELECT id, path, slot, owner_kind, owner_id, created_at \
             FROM uploads WHERE owner_kind = $1 AND owner_id = $2 AND slot = $3 \
             ORDER BY id LIMIT 1",
        )
        .bind(owner_kind.as_str())
        .bind(owner_id)
        .bind(slot.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(UploadRow::into_upload).transpose()
    }

    async fn list_for_owner(
        &self,
        owner_kind: ContentKind,
        owner_id: Id,
    ) -> LedgerResult<Vec<Upload>> {
        let rows = sqlx::query_as::<_, UploadRow>(
            "SELECT id, path, slot, owner_kind, owner_id, created_at \
             FROM uploads WHERE owner_kind = $1 AND owner_id = $2 ORDER BY id",
        )
        .bind(owner_kind.as_str())
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(UploadRow::into_upload).collect()
    }

    async fn delete(&self, id: Id) -> LedgerResult<()> {
        sqlx::query("DELETE FROM uploads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_upload() {
        let row = UploadRow {
            id: 9,
            path: "https://bucket.test/units/1/gallery/a.png".to_string(),
            slot: "gallery".to_string(),
            owner_kind: "unit".to_string(),
            owner_id: 1,
            created_at: Utc::now(),
        };

        let upload = row.into_upload().unwrap();
        assert_eq!(upload.id, Some(9));
        assert_eq!(upload.slot, AssetSlot::Gallery);
        assert_eq!(upload.owner_kind, ContentKind::Unit);
    }

    #[test]
    fn test_row_with_unknown_slot() {
        let row = UploadRow {
            id: 1,
            path: "https://bucket.test/x".to_string(),
            slot: "banner".to_string(),
            owner_kind: "unit".to_string(),
            owner_id: 1,
            created_at: Utc::now(),
        };

        assert!(matches!(
            row.into_upload(),
            Err(LedgerError::BackendError(_))
        ));
    }
}
