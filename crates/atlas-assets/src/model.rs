//! Asset ledger model.

use atlas_core::{ContentKind, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The semantic role of an image asset on its owning entity.
///
/// The first three are singleton slots: at most one upload per owner per
/// slot, enforced procedurally (delete-before-create) rather than by a
/// uniqueness constraint. `Gallery` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetSlot {
    ProfileImage,
    HeaderImage,
    FooterImage,
    Gallery,
}

impl AssetSlot {
    pub const SINGLETONS: [AssetSlot; 3] =
        [Self::ProfileImage, Self::HeaderImage, Self::FooterImage];

    pub fn is_singleton(&self) -> bool {
        !matches!(self, Self::Gallery)
    }

    /// Key path segment for this slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfileImage => "profileImage",
            Self::HeaderImage => "headerImage",
            Self::FooterImage => "footerImage",
            Self::Gallery => "gallery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "profileImage" => Some(Self::ProfileImage),
            "headerImage" => Some(Self::HeaderImage),
            "footerImage" => Some(Self::FooterImage),
            "gallery" => Some(Self::Gallery),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asset ledger row: a stored binary asset bound to exactly one owning
/// content entity.
///
/// `path` is always the fully-qualified, dereferenceable URL of the remote
/// object, never a bare storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: Option<Id>,
    pub path: String,
    pub slot: AssetSlot,
    pub owner_kind: ContentKind,
    pub owner_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Upload {
    pub fn new(
        path: impl Into<String>,
        slot: AssetSlot,
        owner_kind: ContentKind,
        owner_id: Id,
    ) -> Self {
        Self {
            id: None,
            path: path.into(),
            slot,
            owner_kind,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_slots() {
        assert!(AssetSlot::ProfileImage.is_singleton());
        assert!(AssetSlot::HeaderImage.is_singleton());
        assert!(AssetSlot::FooterImage.is_singleton());
        assert!(!AssetSlot::Gallery.is_singleton());
    }

    #[test]
    fn test_slot_roundtrip() {
        for slot in [
            AssetSlot::ProfileImage,
            AssetSlot::HeaderImage,
            AssetSlot::FooterImage,
            AssetSlot::Gallery,
        ] {
            assert_eq!(AssetSlot::parse(slot.as_str()), Some(slot));
        }
        assert_eq!(AssetSlot::parse("thumbnail"), None);
    }

    #[test]
    fn test_upload_construction() {
        let upload = Upload::new(
            "https://bucket.s3.amazonaws.com/units/1/gallery/abc.png",
            AssetSlot::Gallery,
            ContentKind::Unit,
            1,
        );
        assert!(upload.id.is_none());
        assert_eq!(upload.owner_id, 1);
        assert_eq!(upload.slot, AssetSlot::Gallery);
    }
}
