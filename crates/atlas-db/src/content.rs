//! Content store backed by Postgres.
//!
//! One `contents` table holds all three kinds, discriminated by the `kind`
//! column; `content_links` holds the directed many-to-many link rows and
//! `content_owners` the unit-to-user ownership rows.

use std::collections::HashMap;

use async_trait::async_trait;
use atlas_core::{ContentKind, Id, PostKind};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use atlas_content::model::{ContentEntity, ContentPatch};
use atlas_content::store::{relation_field, ContentStore, ContentStoreError, ContentStoreResult};

use crate::is_foreign_key_violation;

const SELECT_COLUMNS: &str = "id, kind, title, intro, subtitle, story, bio, body, quote, \
     color, post_kind, is_published, created_at, updated_at";

/// Content row from database
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub intro: String,
    pub subtitle: Option<String>,
    pub story: Option<String>,
    pub bio: Option<String>,
    pub body: Option<String>,
    pub quote: Option<String>,
    pub color: Option<String>,
    pub post_kind: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRow {
    fn into_entity(self) -> ContentStoreResult<ContentEntity> {
        let kind = ContentKind::parse(&self.kind)
            .ok_or_else(|| ContentStoreError::Backend(format!("unknown kind: {}", self.kind)))?;
        let post_kind = self
            .post_kind
            .as_deref()
            .map(|s| {
                PostKind::parse(s)
                    .ok_or_else(|| ContentStoreError::Backend(format!("unknown post kind: {}", s)))
            })
            .transpose()?;

        Ok(ContentEntity {
            id: Some(self.id),
            kind,
            title: self.title,
            intro: self.intro,
            subtitle: self.subtitle,
            story: self.story,
            bio: self.bio,
            body: self.body,
            quote: self.quote,
            color: self.color,
            post_kind,
            is_published: self.is_published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn backend(err: sqlx::Error) -> ContentStoreError {
    ContentStoreError::Backend(err.to_string())
}

/// Production content store
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn rows_to_entities(
        rows: Vec<ContentRow>,
    ) -> ContentStoreResult<Vec<ContentEntity>> {
        rows.into_iter().map(ContentRow::into_entity).collect()
    }
}

/// Guarded link insert: the SELECT rejects ids of the wrong kind as
/// well as absent rows.
async fn insert_link(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    kind: ContentKind,
    id: Id,
    target_kind: ContentKind,
    target_id: Id,
) -> ContentStoreResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO content_links (source_kind, source_id, target_kind, target_id)
        SELECT $1, $2, $3, id FROM contents WHERE kind = $3 AND id = $4
        "#,
    )
    .bind(kind.as_str())
    .bind(id)
    .bind(target_kind.as_str())
    .bind(target_id)
    .execute(&mut **tx)
    .await
    .map_err(|err| {
        if is_foreign_key_violation(&err) {
            ContentStoreError::Referential {
                field: relation_field(target_kind),
            }
        } else {
            backend(err)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(ContentStoreError::Referential {
            field: relation_field(target_kind),
        });
    }
    Ok(())
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn insert(
        &self,
        entity: &mut ContentEntity,
        relations: &HashMap<ContentKind, Vec<Id>>,
        owner_id: Option<Id>,
    ) -> ContentStoreResult<Id> {
        // Row, link rows and owner row commit together, so a referential
        // failure rolls the whole insert back.
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO contents (kind, title, intro, subtitle, story, bio, body,
                                  quote, color, post_kind, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(entity.kind.as_str())
        .bind(&entity.title)
        .bind(&entity.intro)
        .bind(&entity.subtitle)
        .bind(&entity.story)
        .bind(&entity.bio)
        .bind(&entity.body)
        .bind(&entity.quote)
        .bind(&entity.color)
        .bind(entity.post_kind.map(|k| k.as_str()))
        .bind(entity.is_published)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        for (&target, target_ids) in relations {
            for &target_id in target_ids {
                insert_link(&mut tx, entity.kind, id, target, target_id).await?;
            }
        }

        if let Some(user_id) = owner_id {
            sqlx::query("INSERT INTO content_owners (content_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|err| {
                    if is_foreign_key_violation(&err) {
                        ContentStoreError::Referential {
                            field: "userId".to_string(),
                        }
                    } else {
                        backend(err)
                    }
                })?;
        }

        tx.commit().await.map_err(backend)?;
        entity.id = Some(id);
        Ok(id)
    }

    async fn find(&self, kind: ContentKind, id: Id) -> ContentStoreResult<Option<ContentEntity>> {
        let row = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM contents WHERE kind = $1 AND id = $2"
        ))
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(ContentRow::into_entity).transpose()
    }

    async fn list(&self, kind: ContentKind) -> ContentStoreResult<Vec<ContentEntity>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM contents WHERE kind = $1 ORDER BY created_at DESC"
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Self::rows_to_entities(rows).await
    }

    async fn list_by_post_kind(
        &self,
        post_kind: PostKind,
    ) -> ContentStoreResult<Vec<ContentEntity>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM contents \
             WHERE kind = 'post' AND post_kind = $1 ORDER BY created_at DESC"
        ))
        .bind(post_kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Self::rows_to_entities(rows).await
    }

    async fn list_related(
        &self,
        kind: ContentKind,
        target_kind: ContentKind,
        target_id: Id,
    ) -> ContentStoreResult<Vec<ContentEntity>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM contents
            WHERE kind = $1 AND id IN (
                SELECT source_id FROM content_links
                 WHERE source_kind = $1 AND target_kind = $2 AND target_id = $3
                UNION
                SELECT target_id FROM content_links
                 WHERE target_kind = $1 AND source_kind = $2 AND source_id = $3
            )
            ORDER BY created_at DESC
            "#
        ))
        .bind(kind.as_str())
        .bind(target_kind.as_str())
        .bind(target_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Self::rows_to_entities(rows).await
    }

    async fn list_owned(&self, user_id: Id) -> ContentStoreResult<Vec<ContentEntity>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM contents
            WHERE kind = 'unit'
              AND id IN (SELECT content_id FROM content_owners WHERE user_id = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Self::rows_to_entities(rows).await
    }

    async fn ids(&self, kind: ContentKind) -> ContentStoreResult<Vec<Id>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM contents WHERE kind = $1")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
    }

    async fn ids_by_post_kind(&self, post_kind: PostKind) -> ContentStoreResult<Vec<Id>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM contents WHERE kind = 'post' AND post_kind = $1",
        )
        .bind(post_kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn apply_patch(
        &self,
        kind: ContentKind,
        id: Id,
        patch: &ContentPatch,
    ) -> ContentStoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE contents SET
                title = COALESCE($3, title),
                intro = COALESCE($4, intro),
                subtitle = COALESCE($5, subtitle),
                story = COALESCE($6, story),
                bio = COALESCE($7, bio),
                body = COALESCE($8, body),
                quote = COALESCE($9, quote),
                color = COALESCE($10, color),
                post_kind = COALESCE($11, post_kind),
                is_published = COALESCE($12, is_published),
                updated_at = NOW()
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.intro)
        .bind(&patch.subtitle)
        .bind(&patch.story)
        .bind(&patch.bio)
        .bind(&patch.body)
        .bind(&patch.quote)
        .bind(&patch.color)
        .bind(patch.post_kind.map(|k| k.as_str()))
        .bind(patch.is_published)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(ContentStoreError::NotFound { kind, id });
        }
        Ok(())
    }

    async fn replace_relations(
        &self,
        kind: ContentKind,
        id: Id,
        target_kind: ContentKind,
        target_ids: &[Id],
    ) -> ContentStoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "DELETE FROM content_links \
             WHERE source_kind = $1 AND source_id = $2 AND target_kind = $3",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(target_kind.as_str())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        for &target_id in target_ids {
            insert_link(&mut tx, kind, id, target_kind, target_id).await?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn relations(
        &self,
        kind: ContentKind,
        id: Id,
        target_kind: ContentKind,
    ) -> ContentStoreResult<Vec<Id>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT target_id FROM content_links \
             WHERE source_kind = $1 AND source_id = $2 AND target_kind = $3 \
             ORDER BY target_id",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(target_kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn clear_relations(&self, kind: ContentKind, id: Id) -> ContentStoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "DELETE FROM content_links \
             WHERE (source_kind = $1 AND source_id = $2) \
                OR (target_kind = $1 AND target_id = $2)",
        )
        .bind(kind.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if kind == ContentKind::Unit {
            sqlx::query("DELETE FROM content_owners WHERE content_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn link_owner(&self, id: Id, user_id: Id) -> ContentStoreResult<()> {
        sqlx::query(
            "INSERT INTO content_owners (content_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                ContentStoreError::Referential {
                    field: "userId".to_string(),
                }
            } else {
                backend(err)
            }
        })?;
        Ok(())
    }

    async fn owner_ids(&self, id: Id) -> ContentStoreResult<Vec<Id>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM content_owners WHERE content_id = $1 ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn delete(&self, kind: ContentKind, id: Id) -> ContentStoreResult<()> {
        sqlx::query("DELETE FROM contents WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn exists(&self, kind: ContentKind, id: Id) -> ContentStoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM contents WHERE kind = $1 AND id = $2)",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }
}
