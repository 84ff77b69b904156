//! Content Lifecycle Coordinator
//!
//! One generic orchestration of entity mutation against the asset ledger
//! and the object store, parameterized by [`KindConfig`]. There is no
//! cross-store transaction: partial failures during slot processing are
//! not rolled back, and the ordering rules here are the consistency
//! mechanism. See the crate docs.

use std::collections::HashMap;
use std::sync::Arc;

use atlas_core::{Id, PostKind, ValidationErrors};
use tracing::{debug, info, instrument, warn};

use atlas_assets::{
    asset_key, key_from_url, AssetLedger, AssetSlot, ObjectStore, Upload,
};

use crate::error::{ContentError, ContentResult};
use crate::kind::KindConfig;
use crate::model::{AttachmentSet, AttachmentUpload, ContentEntity, ContentPatch, ContentView, NewContent};
use crate::store::ContentStore;

/// Delete one asset: remote object first, ledger row second.
///
/// An absent ledger row is a no-op, so concurrent deletes of the same id
/// cannot fail each other. A remote-store failure is logged and swallowed,
/// accepting an occasionally orphaned remote object over a permanently
/// stuck ledger row. A ledger failure is escalated.
pub async fn delete_asset(
    ledger: &dyn AssetLedger,
    objects: &dyn ObjectStore,
    upload_id: Id,
) -> ContentResult<()> {
    let Some(upload) = ledger.find(upload_id).await? else {
        debug!(upload_id, "Upload already deleted, skipping");
        return Ok(());
    };

    match key_from_url(&upload.path) {
        Some(key) => {
            if let Err(err) = objects.delete(&key).await {
                warn!(upload_id, key, %err, "Remote delete failed, removing ledger row anyway");
            }
        }
        None => {
            warn!(upload_id, path = %upload.path, "Stored path is not a valid URL, skipping remote delete");
        }
    }

    ledger.delete(upload_id).await?;
    Ok(())
}

/// The generic per-kind content service.
pub struct ContentCoordinator {
    config: KindConfig,
    contents: Arc<dyn ContentStore>,
    ledger: Arc<dyn AssetLedger>,
    objects: Arc<dyn ObjectStore>,
}

impl ContentCoordinator {
    pub fn new(
        config: KindConfig,
        contents: Arc<dyn ContentStore>,
        ledger: Arc<dyn AssetLedger>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            contents,
            ledger,
            objects,
        }
    }

    pub fn config(&self) -> &KindConfig {
        &self.config
    }

    /// Create an entity with its initial relation links and attachments.
    ///
    /// Slot processing is sequential in fixed order (profile, header,
    /// footer, then each gallery item); a failure partway through leaves
    /// earlier uploads recorded.
    #[instrument(skip(self, input, attachments), fields(kind = %self.config.kind))]
    pub async fn create(
        &self,
        input: NewContent,
        attachments: AttachmentSet,
        caller_id: Option<Id>,
    ) -> ContentResult<ContentView> {
        let mut errors = ValidationErrors::new();
        if input.title.trim().is_empty() {
            errors.add("title", "can't be blank");
        }
        if input.intro.trim().is_empty() {
            errors.add("intro", "can't be blank");
        }
        if self.config.kinded && input.post_kind.is_none() {
            errors.add("kind", "can't be blank");
        }
        if !errors.is_empty() {
            return Err(ContentError::Validation(errors));
        }

        let mut entity = ContentEntity::new(self.config.kind, input.title, input.intro);
        entity.subtitle = input.subtitle;
        entity.story = input.story;
        entity.bio = input.bio;
        entity.body = input.body;
        entity.quote = input.quote;
        entity.color = input.color;
        entity.post_kind = input.post_kind;
        entity.is_published = input.is_published;

        // Row, relation links and owner go into the store as one atomic
        // insert; a referential failure leaves nothing behind.
        let mut relations = HashMap::new();
        for &target in self.config.relations {
            if let Some(ids) = input.relations.get(&target) {
                relations.insert(target, ids.clone());
            }
        }
        let owner_id = if self.config.owned_by_users {
            caller_id
        } else {
            None
        };

        let id = self.contents.insert(&mut entity, &relations, owner_id).await?;
        info!(kind = %self.config.kind, id, "Content created");

        self.process_slots(id, &attachments).await?;

        self.view(id).await
    }

    /// Update an entity: gallery deletes, singleton replaces, gallery
    /// additions, scalar patch, relation replace. In that order.
    #[instrument(skip(self, patch, attachments, gallery_ids_to_delete), fields(kind = %self.config.kind))]
    pub async fn update(
        &self,
        id: Id,
        patch: ContentPatch,
        attachments: AttachmentSet,
        gallery_ids_to_delete: &[Id],
    ) -> ContentResult<ContentView> {
        if self.contents.find(self.config.kind, id).await?.is_none() {
            return Err(ContentError::not_found(self.config.kind, id));
        }

        // Best effort: a delete that fails is logged and skipped, the
        // rest of the update proceeds.
        for &upload_id in gallery_ids_to_delete {
            if let Err(err) = delete_asset(&*self.ledger, &*self.objects, upload_id).await {
                warn!(upload_id, %err, "Gallery delete failed, continuing update");
            }
        }

        // Singleton slots replace by delete-then-create, never in place.
        // A slot is briefly empty rather than ever holding two assets.
        for slot in AssetSlot::SINGLETONS {
            if let Some(attachment) = attachments.singleton(slot) {
                if let Some(existing) = self
                    .ledger
                    .find_singleton(self.config.kind, id, slot)
                    .await?
                {
                    if let Some(existing_id) = existing.id {
                        delete_asset(&*self.ledger, &*self.objects, existing_id).await?;
                    }
                }
                self.upload_and_record(id, slot, attachment).await?;
            }
        }

        for attachment in &attachments.gallery {
            self.upload_and_record(id, AssetSlot::Gallery, attachment)
                .await?;
        }

        if !patch.is_empty() {
            self.contents
                .apply_patch(self.config.kind, id, &patch)
                .await?;
        }

        // A missing key leaves the relation untouched; an empty list
        // clears it.
        for &target in self.config.relations {
            if let Some(ids) = patch.relations.get(&target) {
                self.contents
                    .replace_relations(self.config.kind, id, target, ids)
                    .await?;
            }
        }

        self.view(id).await
    }

    /// Delete an entity and everything it owns.
    ///
    /// Assets go first, then relation links, then the row, so a mid-failure
    /// state always leaves the entity discoverable for a retry.
    #[instrument(skip(self), fields(kind = %self.config.kind))]
    pub async fn remove(&self, id: Id) -> ContentResult<()> {
        if self.contents.find(self.config.kind, id).await?.is_none() {
            return Err(ContentError::not_found(self.config.kind, id));
        }

        let uploads = self.ledger.list_for_owner(self.config.kind, id).await?;
        for upload in &uploads {
            if let Some(upload_id) = upload.id {
                delete_asset(&*self.ledger, &*self.objects, upload_id).await?;
            }
        }

        self.contents.clear_relations(self.config.kind, id).await?;
        self.contents.delete(self.config.kind, id).await?;
        info!(kind = %self.config.kind, id, assets = uploads.len(), "Content removed");
        Ok(())
    }

    pub async fn get(&self, id: Id) -> ContentResult<ContentView> {
        if self.contents.find(self.config.kind, id).await?.is_none() {
            return Err(ContentError::not_found(self.config.kind, id));
        }
        self.view(id).await
    }

    pub async fn list(&self) -> ContentResult<Vec<ContentView>> {
        let entities = self.contents.list(self.config.kind).await?;
        self.views(entities).await
    }

    /// Posts of one discriminant, e.g. the Region kind for map browsing.
    pub async fn list_by_post_kind(&self, post_kind: PostKind) -> ContentResult<Vec<ContentView>> {
        let entities = self.contents.list_by_post_kind(post_kind).await?;
        self.views(entities).await
    }

    /// Entities linked to one target, e.g. Units of a Class.
    pub async fn list_related(
        &self,
        target_kind: atlas_core::ContentKind,
        target_id: Id,
    ) -> ContentResult<Vec<ContentView>> {
        let entities = self
            .contents
            .list_related(self.config.kind, target_kind, target_id)
            .await?;
        self.views(entities).await
    }

    /// Units owned by a user.
    pub async fn list_owned(&self, user_id: Id) -> ContentResult<Vec<ContentView>> {
        let entities = self.contents.list_owned(user_id).await?;
        self.views(entities).await
    }

    /// Explicit gallery-asset deletion by ledger id.
    #[instrument(skip(self))]
    pub async fn delete_gallery_asset(&self, upload_id: Id) -> ContentResult<()> {
        delete_asset(&*self.ledger, &*self.objects, upload_id).await
    }

    /// Upload one attachment and record the ledger row. The row is only
    /// written after a successful remote write.
    async fn upload_and_record(
        &self,
        owner_id: Id,
        slot: AssetSlot,
        attachment: &AttachmentUpload,
    ) -> ContentResult<Upload> {
        let key = asset_key(self.config.kind, owner_id, slot, &attachment.filename);
        let url = self
            .objects
            .put(&key, &attachment.content_type, attachment.data.clone())
            .await?;

        let mut upload = Upload::new(url, slot, self.config.kind, owner_id);
        self.ledger.record(&mut upload).await?;
        debug!(owner_id, slot = %slot, key, "Asset recorded");
        Ok(upload)
    }

    /// Fixed slot order: profile, header, footer, then each gallery item.
    async fn process_slots(&self, id: Id, attachments: &AttachmentSet) -> ContentResult<()> {
        for slot in AssetSlot::SINGLETONS {
            if let Some(attachment) = attachments.singleton(slot) {
                self.upload_and_record(id, slot, attachment).await?;
            }
        }
        for attachment in &attachments.gallery {
            self.upload_and_record(id, AssetSlot::Gallery, attachment)
                .await?;
        }
        Ok(())
    }

    /// Re-fetch and project, with relation and owner id lists attached.
    async fn view(&self, id: Id) -> ContentResult<ContentView> {
        let entity = self
            .contents
            .find(self.config.kind, id)
            .await?
            .ok_or_else(|| ContentError::not_found(self.config.kind, id))?;

        let uploads = self.ledger.list_for_owner(self.config.kind, id).await?;
        let mut view = ContentView::project(&entity, id, &uploads);

        for &target in self.config.relations {
            let ids = self.contents.relations(self.config.kind, id, target).await?;
            view.set_relation_ids(target, ids);
        }
        if self.config.owned_by_users {
            view.owner_ids = Some(self.contents.owner_ids(id).await?);
        }
        Ok(view)
    }

    async fn views(&self, entities: Vec<ContentEntity>) -> ContentResult<Vec<ContentView>> {
        let mut views = Vec::with_capacity(entities.len());
        for entity in &entities {
            if let Some(id) = entity.id {
                views.push(self.view(id).await?);
            }
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use atlas_assets::{
        FailingObjectStore, MemoryAssetLedger, MemoryObjectStore,
    };
    use atlas_core::ContentKind;
    use bytes::Bytes;

    use super::*;
    use crate::store::MemoryContentStore;

    struct Harness {
        contents: Arc<MemoryContentStore>,
        ledger: Arc<MemoryAssetLedger>,
        objects: Arc<MemoryObjectStore>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                contents: Arc::new(MemoryContentStore::new()),
                ledger: Arc::new(MemoryAssetLedger::new()),
                objects: Arc::new(MemoryObjectStore::new()),
            }
        }

        fn coordinator(&self, config: KindConfig) -> ContentCoordinator {
            ContentCoordinator::new(
                config,
                self.contents.clone(),
                self.ledger.clone(),
                self.objects.clone(),
            )
        }
    }

    fn png(name: &str) -> AttachmentUpload {
        AttachmentUpload::new(name, "image/png", Bytes::from_static(b"\x89PNG"))
    }

    fn new_content(title: &str, intro: &str) -> NewContent {
        NewContent {
            title: title.to_string(),
            intro: intro.to_string(),
            ..NewContent::default()
        }
    }

    async fn create_bare(coordinator: &ContentCoordinator) -> Id {
        let view = coordinator
            .create(new_content("t", "i"), AttachmentSet::default(), None)
            .await
            .unwrap();
        view.id
    }

    #[tokio::test]
    async fn test_create_requires_title_and_intro() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        let err = coordinator
            .create(new_content("", " "), AttachmentSet::default(), None)
            .await
            .unwrap_err();
        let ContentError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_error("title"));
        assert!(errors.has_error("intro"));
    }

    #[tokio::test]
    async fn test_create_post_requires_kind() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::POST);

        let err = coordinator
            .create(new_content("t", "i"), AttachmentSet::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));

        let input = NewContent {
            post_kind: Some(PostKind::Science),
            ..new_content("t", "i")
        };
        coordinator
            .create(input, AttachmentSet::default(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_with_unresolved_relation_fails_referential() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        let mut input = new_content("t", "i");
        input.relations.insert(ContentKind::Class, vec![999]);

        let err = coordinator
            .create(input, AttachmentSet::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Referential { ref field } if field == "classIds"));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_row() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        let mut input = new_content("t", "i");
        input.relations.insert(ContentKind::Class, vec![999]);
        coordinator
            .create(input, AttachmentSet::default(), None)
            .await
            .unwrap_err();
        assert!(coordinator.list().await.unwrap().is_empty());

        // Unknown caller fails the same way
        let err = coordinator
            .create(new_content("t", "i"), AttachmentSet::default(), Some(404))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Referential { ref field } if field == "userId"));
        assert!(coordinator.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_links_caller_as_owner() {
        let h = Harness::new();
        h.contents.seed_user(7).await;
        let coordinator = h.coordinator(KindConfig::UNIT);

        let view = coordinator
            .create(new_content("t", "i"), AttachmentSet::default(), Some(7))
            .await
            .unwrap();
        assert_eq!(view.owner_ids, Some(vec![7]));
    }

    #[tokio::test]
    async fn test_idempotent_asset_delete() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);
        let id = create_bare(&coordinator).await;

        let attachments = AttachmentSet {
            gallery: vec![png("a.png")],
            ..AttachmentSet::default()
        };
        let view = coordinator.update(id, ContentPatch::default(), attachments, &[]).await.unwrap();
        let upload_id = view.gallery_images[0].id;

        coordinator.delete_gallery_asset(upload_id).await.unwrap();
        // Second call is a no-op, not an error
        coordinator.delete_gallery_asset(upload_id).await.unwrap();
        assert!(h.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_singleton_invariant_across_updates() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        let attachments = AttachmentSet {
            profile: Some(png("first.png")),
            ..AttachmentSet::default()
        };
        let view = coordinator
            .create(new_content("t", "i"), attachments, None)
            .await
            .unwrap();
        let id = view.id;

        for n in 0..3 {
            let attachments = AttachmentSet {
                profile: Some(png(&format!("v{}.png", n))),
                header: Some(png(&format!("h{}.png", n))),
                ..AttachmentSet::default()
            };
            coordinator
                .update(id, ContentPatch::default(), attachments, &[])
                .await
                .unwrap();
        }

        let uploads = h.ledger.list_for_owner(ContentKind::Unit, id).await.unwrap();
        for slot in AssetSlot::SINGLETONS {
            let count = uploads.iter().filter(|u| u.slot == slot).count();
            assert!(count <= 1, "slot {} has {} rows", slot, count);
        }
        // The remote bucket holds exactly the surviving assets
        assert_eq!(h.objects.list("units/").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_gallery_additivity() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::CLASS);
        let view = coordinator
            .create(new_content("t", "i"), AttachmentSet::default(), None)
            .await
            .unwrap();
        let id = view.id;

        let add_two = AttachmentSet {
            gallery: vec![png("a.png"), png("b.png")],
            ..AttachmentSet::default()
        };
        let view = coordinator
            .update(id, ContentPatch::default(), add_two, &[])
            .await
            .unwrap();
        assert_eq!(view.gallery.len(), 2);

        // One add, one delete: net zero
        let doomed = view.gallery_images[0].id;
        let add_one = AttachmentSet {
            gallery: vec![png("c.png")],
            ..AttachmentSet::default()
        };
        let view = coordinator
            .update(id, ContentPatch::default(), add_one, &[doomed])
            .await
            .unwrap();
        assert_eq!(view.gallery.len(), 2);
        assert!(view.gallery_images.iter().all(|g| g.id != doomed));
    }

    #[tokio::test]
    async fn test_partial_update_non_destructive() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        let input = NewContent {
            subtitle: Some("sub".to_string()),
            quote: Some("quote".to_string()),
            ..new_content("before", "intro text")
        };
        let view = coordinator
            .create(input, AttachmentSet::default(), None)
            .await
            .unwrap();

        let patch = ContentPatch {
            title: Some("after".to_string()),
            ..ContentPatch::default()
        };
        let updated = coordinator
            .update(view.id, patch, AttachmentSet::default(), &[])
            .await
            .unwrap();

        assert_eq!(updated.title, "after");
        assert_eq!(updated.intro, view.intro);
        assert_eq!(updated.subtitle, view.subtitle);
        assert_eq!(updated.quote, view.quote);
        assert_eq!(updated.is_published, view.is_published);
    }

    #[tokio::test]
    async fn test_relation_replace_wholesale() {
        let h = Harness::new();
        let classes = h.coordinator(KindConfig::CLASS);
        let units = h.coordinator(KindConfig::UNIT);

        let a = create_bare(&classes).await;
        let b = create_bare(&classes).await;
        let c = create_bare(&classes).await;
        let unit = create_bare(&units).await;

        let mut patch = ContentPatch::default();
        patch.relations.insert(ContentKind::Class, vec![a, b]);
        units
            .update(unit, patch, AttachmentSet::default(), &[])
            .await
            .unwrap();

        let mut patch = ContentPatch::default();
        patch.relations.insert(ContentKind::Class, vec![c]);
        let view = units
            .update(unit, patch, AttachmentSet::default(), &[])
            .await
            .unwrap();
        assert_eq!(view.class_ids, Some(vec![c]));
    }

    #[tokio::test]
    async fn test_empty_relation_list_clears_absent_keeps() {
        let h = Harness::new();
        let classes = h.coordinator(KindConfig::CLASS);
        let units = h.coordinator(KindConfig::UNIT);

        let a = create_bare(&classes).await;
        let unit = create_bare(&units).await;

        let mut patch = ContentPatch::default();
        patch.relations.insert(ContentKind::Class, vec![a]);
        units.update(unit, patch, AttachmentSet::default(), &[]).await.unwrap();

        // No relations key: untouched
        let view = units
            .update(unit, ContentPatch::default(), AttachmentSet::default(), &[])
            .await
            .unwrap();
        assert_eq!(view.class_ids, Some(vec![a]));

        // Explicit empty list: cleared
        let mut patch = ContentPatch::default();
        patch.relations.insert(ContentKind::Class, vec![]);
        let view = units.update(unit, patch, AttachmentSet::default(), &[]).await.unwrap();
        assert_eq!(view.class_ids, Some(vec![]));
    }

    #[tokio::test]
    async fn test_cascade_completeness() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        let attachments = AttachmentSet {
            profile: Some(png("p.png")),
            gallery: vec![png("g1.png"), png("g2.png")],
            ..AttachmentSet::default()
        };
        let view = coordinator
            .create(new_content("t", "i"), attachments, None)
            .await
            .unwrap();
        let id = view.id;

        coordinator.remove(id).await.unwrap();

        assert!(h.ledger.list_for_owner(ContentKind::Unit, id).await.unwrap().is_empty());
        assert!(matches!(
            coordinator.get(id).await.unwrap_err(),
            ContentError::NotFound { .. }
        ));
        let remaining = h.objects.list(&format!("units/{}/", id)).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_not_found() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::POST);
        assert!(matches!(
            coordinator.remove(404).await.unwrap_err(),
            ContentError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_gallery_delete_does_not_abort_update() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);
        let id = create_bare(&coordinator).await;

        // Deleting never-issued upload ids is a no-op; the patch still lands
        let patch = ContentPatch {
            title: Some("renamed".to_string()),
            ..ContentPatch::default()
        };
        let view = coordinator
            .update(id, patch, AttachmentSet::default(), &[111, 222])
            .await
            .unwrap();
        assert_eq!(view.title, "renamed");
    }

    #[tokio::test]
    async fn test_remote_failure_during_create_aborts_slot_processing() {
        let contents = Arc::new(MemoryContentStore::new());
        let ledger = Arc::new(MemoryAssetLedger::new());
        let coordinator = ContentCoordinator::new(
            KindConfig::UNIT,
            contents.clone(),
            ledger.clone(),
            Arc::new(FailingObjectStore),
        );

        let attachments = AttachmentSet {
            profile: Some(png("p.png")),
            ..AttachmentSet::default()
        };
        let err = coordinator
            .create(new_content("t", "i"), attachments, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::RemoteStore(_)));

        // The row was inserted before slot processing and is not rolled back
        assert_eq!(contents.ids(ContentKind::Unit).await.unwrap().len(), 1);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_no_ledger_row_without_remote_write() {
        let contents = Arc::new(MemoryContentStore::new());
        let ledger = Arc::new(MemoryAssetLedger::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let coordinator = ContentCoordinator::new(
            KindConfig::CLASS,
            contents.clone(),
            ledger.clone(),
            objects.clone(),
        );

        let attachments = AttachmentSet {
            gallery: vec![png("a.png")],
            ..AttachmentSet::default()
        };
        let view = coordinator
            .create(new_content("t", "i"), attachments, None)
            .await
            .unwrap();

        // Every ledger path is a URL the store actually serves
        let uploads = ledger.list_for_owner(ContentKind::Class, view.id).await.unwrap();
        assert_eq!(uploads.len(), 1);
        let key = key_from_url(&uploads[0].path).unwrap();
        assert!(objects.contains(&key).await);
    }

    #[tokio::test]
    async fn test_end_to_end_unit_lifecycle() {
        let h = Harness::new();
        let coordinator = h.coordinator(KindConfig::UNIT);

        // Create with a profile image
        let attachments = AttachmentSet {
            profile: Some(png("solaris.png")),
            ..AttachmentSet::default()
        };
        let view = coordinator
            .create(new_content("Solaris", "intro text"), attachments, None)
            .await
            .unwrap();
        let id = view.id;
        let first_path = view.profile_image.clone().unwrap();
        assert!(!first_path.is_empty());
        assert!(view.gallery.is_empty());

        // Replace the profile image
        let attachments = AttachmentSet {
            profile: Some(png("solaris2.png")),
            ..AttachmentSet::default()
        };
        coordinator
            .update(id, ContentPatch::default(), attachments, &[])
            .await
            .unwrap();

        let uploads = h.ledger.list_for_owner(ContentKind::Unit, id).await.unwrap();
        let profiles: Vec<_> = uploads
            .iter()
            .filter(|u| u.slot == AssetSlot::ProfileImage)
            .collect();
        assert_eq!(profiles.len(), 1);
        assert_ne!(profiles[0].path, first_path);

        // Remove: entity unfetchable, bucket prefix empty
        coordinator.remove(id).await.unwrap();
        assert!(matches!(
            coordinator.get(id).await.unwrap_err(),
            ContentError::NotFound { .. }
        ));
        let keys = h.objects.list(&format!("units/{}/", id)).await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_view_relations_only_for_configured_targets() {
        let h = Harness::new();
        let posts = h.coordinator(KindConfig::POST);

        let input = NewContent {
            post_kind: Some(PostKind::Region),
            relations: HashMap::new(),
            ..new_content("r", "i")
        };
        let view = posts.create(input, AttachmentSet::default(), None).await.unwrap();
        assert_eq!(view.class_ids, Some(vec![]));
        assert_eq!(view.unit_ids, Some(vec![]));
        assert!(view.post_ids.is_none());
        assert!(view.owner_ids.is_none());
    }
}
