//! Content entity model, mutation inputs and the projected view.

use std::collections::HashMap;

use atlas_core::{ContentKind, Id, PostKind};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atlas_assets::{AssetSlot, Upload};

/// A Class, Unit or Post row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: Option<Id>,
    pub kind: ContentKind,
    pub title: String,
    pub intro: String,
    pub subtitle: Option<String>,
    pub story: Option<String>,
    pub bio: Option<String>,
    pub body: Option<String>,
    pub quote: Option<String>,
    pub color: Option<String>,
    /// Post discriminant, None for other kinds.
    pub post_kind: Option<PostKind>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentEntity {
    pub fn new(kind: ContentKind, title: impl Into<String>, intro: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            kind,
            title: title.into(),
            intro: intro.into(),
            subtitle: None,
            story: None,
            bio: None,
            body: None,
            quote: None,
            color: None,
            post_kind: None,
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Fields for entity creation. Absent optional fields are normalized to
/// None on the row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
    pub title: String,
    pub intro: String,
    pub subtitle: Option<String>,
    pub story: Option<String>,
    pub bio: Option<String>,
    pub body: Option<String>,
    pub quote: Option<String>,
    pub color: Option<String>,
    pub post_kind: Option<PostKind>,
    #[serde(default)]
    pub is_published: bool,
    /// Initial relation links, keyed by target kind. A missing key means
    /// no links of that kind.
    #[serde(skip)]
    pub relations: HashMap<ContentKind, Vec<Id>>,
}

/// Partial scalar patch. A `None` field is left untouched on the row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    pub title: Option<String>,
    pub intro: Option<String>,
    pub subtitle: Option<String>,
    pub story: Option<String>,
    pub bio: Option<String>,
    pub body: Option<String>,
    pub quote: Option<String>,
    pub color: Option<String>,
    pub post_kind: Option<PostKind>,
    pub is_published: Option<bool>,
    /// Relation sets to replace wholesale. A missing key leaves that
    /// relation untouched; an empty list clears it.
    #[serde(skip)]
    pub relations: HashMap<ContentKind, Vec<Id>>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.intro.is_none()
            && self.subtitle.is_none()
            && self.story.is_none()
            && self.bio.is_none()
            && self.body.is_none()
            && self.quote.is_none()
            && self.color.is_none()
            && self.post_kind.is_none()
            && self.is_published.is_none()
            && self.relations.is_empty()
    }
}

/// One binary attachment as received from the client.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl AttachmentUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Attachments of one request, partitioned by slot.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    pub profile: Option<AttachmentUpload>,
    pub header: Option<AttachmentUpload>,
    pub footer: Option<AttachmentUpload>,
    pub gallery: Vec<AttachmentUpload>,
}

impl AttachmentSet {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self.header.is_none()
            && self.footer.is_none()
            && self.gallery.is_empty()
    }

    /// The attachment for a singleton slot, if supplied.
    pub fn singleton(&self, slot: AssetSlot) -> Option<&AttachmentUpload> {
        match slot {
            AssetSlot::ProfileImage => self.profile.as_ref(),
            AssetSlot::HeaderImage => self.header.as_ref(),
            AssetSlot::FooterImage => self.footer.as_ref(),
            AssetSlot::Gallery => None,
        }
    }
}

/// A gallery entry in the projected view, carrying the ledger id so the
/// client can delete it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: Id,
    pub url: String,
}

/// The response shape for a content entity: the row's scalar fields plus
/// denormalized asset and relation fields. Computed on read, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    pub id: Id,
    pub kind: ContentKind,
    pub title: String,
    pub intro: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_kind: Option<PostKind>,
    pub is_published: bool,
    pub profile_image: Option<String>,
    pub header_image: Option<String>,
    pub footer_image: Option<String>,
    pub gallery: Vec<String>,
    pub gallery_images: Vec<GalleryImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_ids: Option<Vec<Id>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentView {
    /// Project an entity and its uploads into the response shape.
    ///
    /// Uploads are partitioned by slot: singleton slots yield at most one
    /// URL each, gallery entries keep ledger order.
    pub fn project(entity: &ContentEntity, id: Id, uploads: &[Upload]) -> Self {
        let single = |slot: AssetSlot| {
            uploads
                .iter()
                .find(|u| u.slot == slot)
                .map(|u| u.path.clone())
        };

        let gallery_images: Vec<GalleryImage> = uploads
            .iter()
            .filter(|u| u.slot == AssetSlot::Gallery)
            .filter_map(|u| {
                u.id.map(|id| GalleryImage {
                    id,
                    url: u.path.clone(),
                })
            })
            .collect();

        Self {
            id,
            kind: entity.kind,
            title: entity.title.clone(),
            intro: entity.intro.clone(),
            subtitle: entity.subtitle.clone(),
            story: entity.story.clone(),
            bio: entity.bio.clone(),
            body: entity.body.clone(),
            quote: entity.quote.clone(),
            color: entity.color.clone(),
            post_kind: entity.post_kind,
            is_published: entity.is_published,
            profile_image: single(AssetSlot::ProfileImage),
            header_image: single(AssetSlot::HeaderImage),
            footer_image: single(AssetSlot::FooterImage),
            gallery: gallery_images.iter().map(|g| g.url.clone()).collect(),
            gallery_images,
            class_ids: None,
            unit_ids: None,
            post_ids: None,
            owner_ids: None,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }

    pub fn set_relation_ids(&mut self, target: ContentKind, ids: Vec<Id>) {
        match target {
            ContentKind::Class => self.class_ids = Some(ids),
            ContentKind::Unit => self.unit_ids = Some(ids),
            ContentKind::Post => self.post_ids = Some(ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(id: Id, slot: AssetSlot, path: &str) -> Upload {
        let mut u = Upload::new(path.to_string(), slot, ContentKind::Unit, 1);
        u.id = Some(id);
        u
    }

    #[test]
    fn test_projection_partitions_by_slot() {
        let entity = ContentEntity::new(ContentKind::Unit, "Solaris", "intro text");
        let uploads = vec![
            upload(1, AssetSlot::ProfileImage, "http://x/p.png"),
            upload(2, AssetSlot::Gallery, "http://x/g1.png"),
            upload(3, AssetSlot::Gallery, "http://x/g2.png"),
        ];

        let view = ContentView::project(&entity, 1, &uploads);
        assert_eq!(view.profile_image.as_deref(), Some("http://x/p.png"));
        assert!(view.header_image.is_none());
        assert_eq!(view.gallery, vec!["http://x/g1.png", "http://x/g2.png"]);
        assert_eq!(view.gallery_images[0].id, 2);
    }

    #[test]
    fn test_projection_empty_gallery() {
        let entity = ContentEntity::new(ContentKind::Class, "t", "i");
        let view = ContentView::project(&entity, 7, &[]);
        assert!(view.gallery.is_empty());
        assert!(view.profile_image.is_none());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ContentPatch::default().is_empty());
        let patch = ContentPatch {
            title: Some("new".to_string()),
            ..ContentPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
