//! # atlas-assets
//!
//! Remote binary assets for content entities:
//!
//! - Storage abstraction over the object store (memory, local filesystem,
//!   S3-compatible)
//! - The `Upload` ledger row binding one stored asset to its owning entity
//! - The `AssetLedger` persistence trait
//! - Storage-key derivation and recovery from stored URLs
//!
//! The ledger and the object store are two independently-failing systems;
//! sequencing between them is the responsibility of the content
//! coordinator, not of this crate.

pub mod keys;
pub mod ledger;
pub mod model;
pub mod store;

pub use keys::{asset_key, content_type_for, gallery_prefix, key_from_url, owner_prefix};
pub use ledger::{AssetLedger, LedgerError, LedgerResult, MemoryAssetLedger};
pub use model::{AssetSlot, Upload};
pub use store::{
    FailingObjectStore, LocalObjectStore, MemoryObjectStore, ObjectStore, S3Config, S3ObjectStore,
    StoreError, StoreResult,
};
