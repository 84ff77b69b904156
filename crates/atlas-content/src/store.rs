//! Content persistence trait and the in-memory implementation used in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use atlas_core::{ContentKind, Id, PostKind};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{ContentEntity, ContentPatch};

#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ContentKind, id: Id },
    #[error("Related entity does not exist: {field}")]
    Referential { field: String },
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type ContentStoreResult<T> = Result<T, ContentStoreError>;

/// Relation field name as surfaced in referential errors, e.g. "classIds".
pub fn relation_field(target: ContentKind) -> String {
    format!("{}Ids", target.as_str())
}

/// Persistence operations the coordinator needs.
///
/// Relation links are directed (source owns the link set); `replace_relations`
/// is a wholesale set-replace, never a diff.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a new row with its initial relation links and optional
    /// owner, atomically: a referential failure leaves no row behind.
    async fn insert(
        &self,
        entity: &mut ContentEntity,
        relations: &HashMap<ContentKind, Vec<Id>>,
        owner_id: Option<Id>,
    ) -> ContentStoreResult<Id>;

    async fn find(&self, kind: ContentKind, id: Id) -> ContentStoreResult<Option<ContentEntity>>;

    async fn list(&self, kind: ContentKind) -> ContentStoreResult<Vec<ContentEntity>>;

    async fn list_by_post_kind(&self, post_kind: PostKind)
        -> ContentStoreResult<Vec<ContentEntity>>;

    /// Entities of `kind` linked (in either direction) to the given target.
    async fn list_related(
        &self,
        kind: ContentKind,
        target_kind: ContentKind,
        target_id: Id,
    ) -> ContentStoreResult<Vec<ContentEntity>>;

    /// Units owned by a user.
    async fn list_owned(&self, user_id: Id) -> ContentStoreResult<Vec<ContentEntity>>;

    async fn ids(&self, kind: ContentKind) -> ContentStoreResult<Vec<Id>>;

    async fn ids_by_post_kind(&self, post_kind: PostKind) -> ContentStoreResult<Vec<Id>>;

    /// Apply the scalar part of a patch. Absent fields are left untouched.
    async fn apply_patch(
        &self,
        kind: ContentKind,
        id: Id,
        patch: &ContentPatch,
    ) -> ContentStoreResult<()>;

    /// Replace the link set from (kind, id) to entities of `target_kind`.
    /// Ids that do not resolve fail the whole call with a referential error
    /// naming the offending field.
    async fn replace_relations(
        &self,
        kind: ContentKind,
        id: Id,
        target_kind: ContentKind,
        target_ids: &[Id],
    ) -> ContentStoreResult<()>;

    /// Ids of `target_kind` entities linked to (kind, id).
    async fn relations(
        &self,
        kind: ContentKind,
        id: Id,
        target_kind: ContentKind,
    ) -> ContentStoreResult<Vec<Id>>;

    /// Remove every link row touching (kind, id), in both directions,
    /// including user-ownership rows.
    async fn clear_relations(&self, kind: ContentKind, id: Id) -> ContentStoreResult<()>;

    /// Record a user as owner of a unit.
    async fn link_owner(&self, id: Id, user_id: Id) -> ContentStoreResult<()>;

    async fn owner_ids(&self, id: Id) -> ContentStoreResult<Vec<Id>>;

    async fn delete(&self, kind: ContentKind, id: Id) -> ContentStoreResult<()>;

    async fn exists(&self, kind: ContentKind, id: Id) -> ContentStoreResult<bool>;
}

/// In-memory content store for testing.
pub struct MemoryContentStore {
    entities: RwLock<Vec<ContentEntity>>,
    /// (source_kind, source_id, target_kind, target_id)
    links: RwLock<Vec<(ContentKind, Id, ContentKind, Id)>>,
    /// (unit_id, user_id)
    owners: RwLock<Vec<(Id, Id)>>,
    /// Known user ids, for ownership referential checks.
    users: RwLock<HashSet<Id>>,
    next_id: AtomicI64,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(Vec::new()),
            links: RwLock::new(Vec::new()),
            owners: RwLock::new(Vec::new()),
            users: RwLock::new(HashSet::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Register a user id so ownership links to it resolve.
    pub async fn seed_user(&self, user_id: Id) {
        self.users.write().await.insert(user_id);
    }

    async fn exists_inner(&self, kind: ContentKind, id: Id) -> bool {
        let entities = self.entities.read().await;
        entities
            .iter()
            .any(|e| e.kind == kind && e.id == Some(id))
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn insert(
        &self,
        entity: &mut ContentEntity,
        relations: &HashMap<ContentKind, Vec<Id>>,
        owner_id: Option<Id>,
    ) -> ContentStoreResult<Id> {
        // All referential checks run before the entity is stored.
        for (&target, ids) in relations {
            for &target_id in ids {
                if !self.exists_inner(target, target_id).await {
                    return Err(ContentStoreError::Referential {
                        field: relation_field(target),
                    });
                }
            }
        }
        if let Some(user_id) = owner_id {
            if !self.users.read().await.contains(&user_id) {
                return Err(ContentStoreError::Referential {
                    field: "userId".to_string(),
                });
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        entity.id = Some(id);

        self.entities.write().await.push(entity.clone());

        let mut links = self.links.write().await;
        for (&target, ids) in relations {
            for &target_id in ids {
                links.push((entity.kind, id, target, target_id));
            }
        }
        drop(links);

        if let Some(user_id) = owner_id {
            self.owners.write().await.push((id, user_id));
        }
        Ok(id)
    }

    async fn find(&self, kind: ContentKind, id: Id) -> ContentStoreResult<Option<ContentEntity>> {
        let entities = self.entities.read().await;
        Ok(entities
            .iter()
            .find(|e| e.kind == kind && e.id == Some(id))
            .cloned())
    }

    async fn list(&self, kind: ContentKind) -> ContentStoreResult<Vec<ContentEntity>> {
        let entities = self.entities.read().await;
        Ok(entities.iter().filter(|e| e.kind == kind).cloned().collect())
    }

    async fn list_by_post_kind(
        &self,
        post_kind: PostKind,
    ) -> ContentStoreResult<Vec<ContentEntity>> {
        let entities = self.entities.read().await;
        Ok(entities
            .iter()
            .filter(|e| e.kind == ContentKind::Post && e.post_kind == Some(post_kind))
            .cloned()
            .collect())
    }

    async fn list_related(
        &self,
        kind: ContentKind,
        target_kind: ContentKind,
        target_id: Id,
    ) -> ContentStoreResult<Vec<ContentEntity>> {
        let links = self.links.read().await;
        let ids: HashSet<Id> = links
            .iter()
            .filter_map(|&(sk, sid, tk, tid)| {
                if sk == kind && tk == target_kind && tid == target_id {
                    Some(sid)
                } else if tk == kind && sk == target_kind && sid == target_id {
                    Some(tid)
                } else {
                    None
                }
            })
            .collect();
        drop(links);

        let entities = self.entities.read().await;
        Ok(entities
            .iter()
            .filter(|e| e.kind == kind && e.id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn list_owned(&self, user_id: Id) -> ContentStoreResult<Vec<ContentEntity>> {
        let owners = self.owners.read().await;
        let ids: HashSet<Id> = owners
            .iter()
            .filter(|&&(_, uid)| uid == user_id)
            .map(|&(id, _)| id)
            .collect();
        drop(owners);

        let entities = self.entities.read().await;
        Ok(entities
            .iter()
            .filter(|e| {
                e.kind == ContentKind::Unit && e.id.map(|id| ids.contains(&id)).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn ids(&self, kind: ContentKind) -> ContentStoreResult<Vec<Id>> {
        let entities = self.entities.read().await;
        Ok(entities
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| e.id)
            .collect())
    }

    async fn ids_by_post_kind(&self, post_kind: PostKind) -> ContentStoreResult<Vec<Id>> {
        let entities = self.entities.read().await;
        Ok(entities
            .iter()
            .filter(|e| e.kind == ContentKind::Post && e.post_kind == Some(post_kind))
            .filter_map(|e| e.id)
            .collect())
    }

    async fn apply_patch(
        &self,
        kind: ContentKind,
        id: Id,
        patch: &ContentPatch,
    ) -> ContentStoreResult<()> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .iter_mut()
            .find(|e| e.kind == kind && e.id == Some(id))
            .ok_or(ContentStoreError::NotFound { kind, id })?;

        if let Some(ref title) = patch.title {
            entity.title = title.clone();
        }
        if let Some(ref intro) = patch.intro {
            entity.intro = intro.clone();
        }
        if let Some(ref subtitle) = patch.subtitle {
            entity.subtitle = Some(subtitle.clone());
        }
        if let Some(ref story) = patch.story {
            entity.story = Some(story.clone());
        }
        if let Some(ref bio) = patch.bio {
            entity.bio = Some(bio.clone());
        }
        if let Some(ref body) = patch.body {
            entity.body = Some(body.clone());
        }
        if let Some(ref quote) = patch.quote {
            entity.quote = Some(quote.clone());
        }
        if let Some(ref color) = patch.color {
            entity.color = Some(color.clone());
        }
        if let Some(post_kind) = patch.post_kind {
            entity.post_kind = Some(post_kind);
        }
        if let Some(is_published) = patch.is_published {
            entity.is_published = is_published;
        }
        entity.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn replace_relations(
        &self,
        kind: ContentKind,
        id: Id,
        target_kind: ContentKind,
        target_ids: &[Id],
    ) -> ContentStoreResult<()> {
        for &target_id in target_ids {
            if !self.exists_inner(target_kind, target_id).await {
                return Err(ContentStoreError::Referential {
                    field: relation_field(target_kind),
                });
            }
        }

        let mut links = self.links.write().await;
        links.retain(|&(sk, sid, tk, _)| !(sk == kind && sid == id && tk == target_kind));
        for &target_id in target_ids {
            links.push((kind, id, target_kind, target_id));
        }
        Ok(())
    }

    async fn relations(
        &self,
        kind: ContentKind,
        id: Id,
        target_kind: ContentKind,
    ) -> ContentStoreResult<Vec<Id>> {
        let links = self.links.read().await;
        Ok(links
            .iter()
            .filter(|&&(sk, sid, tk, _)| sk == kind && sid == id && tk == target_kind)
            .map(|&(_, _, _, tid)| tid)
            .collect())
    }

    async fn clear_relations(&self, kind: ContentKind, id: Id) -> ContentStoreResult<()> {
        let mut links = self.links.write().await;
        links.retain(|&(sk, sid, tk, tid)| {
            !((sk == kind && sid == id) || (tk == kind && tid == id))
        });
        drop(links);

        if kind == ContentKind::Unit {
            let mut owners = self.owners.write().await;
            owners.retain(|&(unit_id, _)| unit_id != id);
        }
        Ok(())
    }

    async fn link_owner(&self, id: Id, user_id: Id) -> ContentStoreResult<()> {
        let users = self.users.read().await;
        if !users.contains(&user_id) {
            return Err(ContentStoreError::Referential {
                field: "userId".to_string(),
            });
        }
        drop(users);

        let mut owners = self.owners.write().await;
        if !owners.contains(&(id, user_id)) {
            owners.push((id, user_id));
        }
        Ok(())
    }

    async fn owner_ids(&self, id: Id) -> ContentStoreResult<Vec<Id>> {
        let owners = self.owners.read().await;
        Ok(owners
            .iter()
            .filter(|&&(unit_id, _)| unit_id == id)
            .map(|&(_, user_id)| user_id)
            .collect())
    }

    async fn delete(&self, kind: ContentKind, id: Id) -> ContentStoreResult<()> {
        let mut entities = self.entities.write().await;
        entities.retain(|e| !(e.kind == kind && e.id == Some(id)));
        Ok(())
    }

    async fn exists(&self, kind: ContentKind, id: Id) -> ContentStoreResult<bool> {
        Ok(self.exists_inner(kind, id).await)
    }
}
