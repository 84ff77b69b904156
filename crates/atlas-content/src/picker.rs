//! Background Image Picker
//!
//! Read-only: gathers every gallery key across Units, Classes and
//! Region-kind Posts, shuffles, and signs the first `n`. Region post
//! assets live under the posts prefix like any other post.

use std::sync::Arc;
use std::time::Duration;

use atlas_core::{ContentKind, PostKind};
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use atlas_assets::{gallery_prefix, ObjectStore};

use crate::error::{ContentError, ContentResult};
use crate::store::ContentStore;

pub struct BackgroundPicker {
    contents: Arc<dyn ContentStore>,
    objects: Arc<dyn ObjectStore>,
    signed_url_ttl: Duration,
}

impl BackgroundPicker {
    pub fn new(
        contents: Arc<dyn ContentStore>,
        objects: Arc<dyn ObjectStore>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            contents,
            objects,
            signed_url_ttl,
        }
    }

    /// Up to `n` signed gallery URLs, uniformly shuffled across the whole
    /// candidate set. URLs expire after the configured TTL. `NoContent`
    /// when nothing is stored.
    #[instrument(skip(self))]
    pub async fn pick_random(&self, n: usize) -> ContentResult<Vec<String>> {
        let mut prefixes = Vec::new();
        for kind in [ContentKind::Unit, ContentKind::Class] {
            for id in self.contents.ids(kind).await? {
                prefixes.push(gallery_prefix(kind, id));
            }
        }
        for id in self.contents.ids_by_post_kind(PostKind::Region).await? {
            prefixes.push(gallery_prefix(ContentKind::Post, id));
        }

        let mut candidates = Vec::new();
        for prefix in &prefixes {
            candidates.extend(self.objects.list(prefix).await?);
        }

        if candidates.is_empty() {
            return Err(ContentError::NoContent);
        }
        debug!(candidates = candidates.len(), n, "Picking background images");

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(n);

        let mut urls = Vec::with_capacity(candidates.len());
        for key in &candidates {
            urls.push(self.objects.sign(key, self.signed_url_ttl).await?);
        }
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use atlas_assets::MemoryObjectStore;
    use bytes::Bytes;

    use super::*;
    use crate::model::ContentEntity;
    use crate::store::MemoryContentStore;

    async fn seed(
        contents: &MemoryContentStore,
        objects: &MemoryObjectStore,
        kind: ContentKind,
        post_kind: Option<PostKind>,
        images: usize,
    ) -> atlas_core::Id {
        let mut entity = ContentEntity::new(kind, "t", "i");
        entity.post_kind = post_kind;
        let id = contents.insert(&mut entity, &HashMap::new(), None).await.unwrap();
        for n in 0..images {
            let key = format!("{}{}.png", gallery_prefix(kind, id), n);
            objects.put(&key, "image/png", Bytes::from("x")).await.unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_empty_candidate_set_is_no_content() {
        let picker = BackgroundPicker::new(
            Arc::new(MemoryContentStore::new()),
            Arc::new(MemoryObjectStore::new()),
            Duration::from_secs(3600),
        );
        assert!(matches!(
            picker.pick_random(4).await.unwrap_err(),
            ContentError::NoContent
        ));
    }

    #[tokio::test]
    async fn test_picks_across_kinds_and_caps_at_n() {
        let contents = Arc::new(MemoryContentStore::new());
        let objects = Arc::new(MemoryObjectStore::new());

        seed(&contents, &objects, ContentKind::Unit, None, 3).await;
        seed(&contents, &objects, ContentKind::Class, None, 2).await;
        seed(&contents, &objects, ContentKind::Post, Some(PostKind::Region), 2).await;
        // Non-region posts are excluded
        let science = seed(&contents, &objects, ContentKind::Post, Some(PostKind::Science), 1).await;

        let picker = BackgroundPicker::new(contents, objects, Duration::from_secs(3600));
        let urls = picker.pick_random(4).await.unwrap();
        assert_eq!(urls.len(), 4);
        let science_prefix = gallery_prefix(ContentKind::Post, science);
        assert!(urls.iter().all(|u| !u.contains(&science_prefix)));

        // n larger than the candidate set returns everything eligible
        let picker_urls = picker.pick_random(100).await.unwrap();
        assert_eq!(picker_urls.len(), 7);
    }

    #[tokio::test]
    async fn test_urls_are_signed() {
        let contents = Arc::new(MemoryContentStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        seed(&contents, &objects, ContentKind::Unit, None, 1).await;

        let picker = BackgroundPicker::new(contents, objects, Duration::from_secs(3600));
        let urls = picker.pick_random(1).await.unwrap();
        assert!(urls[0].contains("expires="));
    }

    #[tokio::test]
    async fn test_signed_urls_use_configured_ttl() {
        let contents = Arc::new(MemoryContentStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        seed(&contents, &objects, ContentKind::Unit, None, 1).await;

        let ttl = Duration::from_secs(86_400);
        let picker = BackgroundPicker::new(contents, objects, ttl);
        let urls = picker.pick_random(1).await.unwrap();

        let expires: i64 = urls[0]
            .rsplit("expires=")
            .next()
            .unwrap()
            .parse()
            .unwrap();
        let expected = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        assert!((expires - expected).abs() < 5);
    }
}
