//! # atlas-content
//!
//! The content lifecycle layer. One generic [`ContentCoordinator`] replaces
//! what would otherwise be three near-identical per-kind services: it
//! sequences entity mutation against the asset ledger and the object store,
//! parameterized by a per-kind [`KindConfig`].
//!
//! The relational store and the object store are two independently-failing
//! systems with no shared commit protocol. The ordering rules implemented
//! here (delete-before-create for singleton slots, assets-before-row for
//! removal) are the sole consistency mechanism.

pub mod coordinator;
pub mod error;
pub mod kind;
pub mod model;
pub mod picker;
pub mod store;

pub use coordinator::{delete_asset, ContentCoordinator};
pub use error::{ContentError, ContentResult};
pub use kind::KindConfig;
pub use model::{
    AttachmentSet, AttachmentUpload, ContentEntity, ContentPatch, ContentView, GalleryImage,
    NewContent,
};
pub use picker::BackgroundPicker;
pub use store::{relation_field, ContentStore, ContentStoreError, MemoryContentStore};
