//! Asset ledger.
//!
//! The ledger is the database-side record of every stored asset. Each row
//! binds one remote URL to one owning entity and slot. Deleting a ledger row
//! never touches the object store; the coordinator sequences the two.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use atlas_core::{ContentKind, Id};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{AssetSlot, Upload};

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Upload not found: {0}")]
    NotFound(Id),
    #[error("Ledger backend error: {0}")]
    BackendError(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Asset ledger trait
#[async_trait]
pub trait AssetLedger: Send + Sync {
    /// Record a new upload row, assigning its id
    async fn record(&self, upload: &mut Upload) -> LedgerResult<Id>;

    /// Get an upload by id
    async fn find(&self, id: Id) -> LedgerResult<Option<Upload>>;

    /// Get the singleton upload for an owner and slot, if any.
    /// Only meaningful for singleton slots.
    async fn find_singleton(
        &self,
        owner_kind: ContentKind,
        owner_id: Id,
        slot: AssetSlot,
    ) -> LedgerResult<Option<Upload>>;

    /// All uploads for an owner, across all slots
    async fn list_for_owner(
        &self,
        owner_kind: ContentKind,
        owner_id: Id,
    ) -> LedgerResult<Vec<Upload>>;

    /// Delete an upload row. Absent ids are not an error.
    async fn delete(&self, id: Id) -> LedgerResult<()>;
}

/// In-memory ledger for testing
pub struct MemoryAssetLedger {
    uploads: RwLock<Vec<Upload>>,
    next_id: AtomicI64,
}

impl Default for MemoryAssetLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAssetLedger {
    pub fn new() -> Self {
        Self {
            uploads: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of ledger rows
    pub async fn len(&self) -> usize {
        self.uploads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.uploads.read().await.is_empty()
    }
}

#[async_trait]
impl AssetLedger for MemoryAssetLedger {
    async fn record(&self, upload: &mut Upload) -> LedgerResult<Id> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        upload.id = Some(id);

        let mut uploads = self.uploads.write().await;
        uploads.push(upload.clone());

        Ok(id)
    }

    async fn find(&self, id: Id) -> LedgerResult<Option<Upload>> {
        let uploads = self.uploads.read().await;
        Ok(uploads.iter().find(|u| u.id == Some(id)).cloned())
    }

    async fn find_singleton(
        &self,
        owner_kind: ContentKind,
        owner_id: Id,
        slot: AssetSlot,
    ) -> LedgerResult<Option<Upload>> {
        let uploads = self.uploads.read().await;
        Ok(uploads
            .iter()
            .find(|u| u.owner_kind == owner_kind && u.owner_id == owner_id && u.slot == slot)
            .cloned())
    }

    async fn list_for_owner(
        &self,
        owner_kind: ContentKind,
        owner_id: Id,
    ) -> LedgerResult<Vec<Upload>> {
        let uploads = self.uploads.read().await;
        Ok(uploads
            .iter()
            .filter(|u| u.owner_kind == owner_kind && u.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Id) -> LedgerResult<()> {
        let mut uploads = self.uploads.write().await;
        uploads.retain(|u| u.id != Some(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(slot: AssetSlot, owner_id: Id) -> Upload {
        Upload::new(
            format!("http://memory.test/units/{}/{}/x.png", owner_id, slot),
            slot,
            ContentKind::Unit,
            owner_id,
        )
    }

    #[tokio::test]
    async fn test_record_assigns_id() {
        let ledger = MemoryAssetLedger::new();
        let mut row = upload(AssetSlot::ProfileImage, 1);

        let id = ledger.record(&mut row).await.unwrap();
        assert_eq!(row.id, Some(id));
        assert!(ledger.find(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_singleton_matches_slot_and_owner() {
        let ledger = MemoryAssetLedger::new();
        ledger.record(&mut upload(AssetSlot::ProfileImage, 1)).await.unwrap();
        ledger.record(&mut upload(AssetSlot::HeaderImage, 1)).await.unwrap();
        ledger.record(&mut upload(AssetSlot::ProfileImage, 2)).await.unwrap();

        let found = ledger
            .find_singleton(ContentKind::Unit, 1, AssetSlot::ProfileImage)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.owner_id, 1);
        assert_eq!(found.slot, AssetSlot::ProfileImage);

        let absent = ledger
            .find_singleton(ContentKind::Class, 1, AssetSlot::ProfileImage)
            .await
            .unwrap();
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn test_list_for_owner() {
        let ledger = MemoryAssetLedger::new();
        ledger.record(&mut upload(AssetSlot::Gallery, 1)).await.unwrap();
        ledger.record(&mut upload(AssetSlot::Gallery, 1)).await.unwrap();
        ledger.record(&mut upload(AssetSlot::Gallery, 2)).await.unwrap();

        let rows = ledger.list_for_owner(ContentKind::Unit, 1).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let ledger = MemoryAssetLedger::new();
        ledger.delete(999).await.unwrap();
        assert!(ledger.is_empty().await);
    }
}
