//! Object store abstraction.
//!
//! A unified interface over the remote bucket that holds uploaded images.
//! `put` returns the public URL of the stored object, which is what the
//! ledger persists.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument};

/// Object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Store backend error: {0}")]
    BackendError(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Object store trait - unified interface for bucket backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store data under a key, returning the public URL of the object
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StoreResult<String>;

    /// Delete an object. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// List all keys under a prefix
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Get a time-limited signed URL for an object
    async fn sign(&self, key: &str, expires_in: Duration) -> StoreResult<String>;

    /// Public (unsigned) URL for a key
    fn public_url(&self, key: &str) -> String;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Local filesystem store
pub struct LocalObjectStore {
    /// Root directory for objects
    root: PathBuf,
    /// Base URL for generating URLs
    base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into(),
        }
    }

    /// Create a store rooted in a temp directory
    pub fn temp() -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join("atlas-assets");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(dir, "http://localhost/assets"))
    }

    /// Resolve a key to a full path
    fn resolve_path(&self, key: &str) -> StoreResult<PathBuf> {
        // Prevent directory traversal
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(key))
    }

    async fn ensure_parent(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn collect_keys(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::collect_keys(root, &path, out)?;
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    #[instrument(skip(self, data), fields(store = "local"))]
    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> StoreResult<String> {
        let path = self.resolve_path(key)?;
        self.ensure_parent(&path).await?;

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        debug!(path = ?path, size = data.len(), "Object stored");

        Ok(self.public_url(key))
    }

    #[instrument(skip(self), fields(store = "local"))]
    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.resolve_path(key)?;

        if path.exists() {
            fs::remove_file(&path).await?;
            debug!(path = ?path, "Object deleted");
        }

        Ok(())
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        // Walk under the deepest directory the prefix names, then filter
        let dir_part = prefix.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let dir = self.resolve_path(dir_part)?;

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        Self::collect_keys(&self.root, &dir, &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    async fn sign(&self, key: &str, expires_in: Duration) -> StoreResult<String> {
        // No access control locally, encode the expiry for parity with S3
        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!("{}?expires={}", self.public_url(key), expires))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// In-memory store for testing
pub struct MemoryObjectStore {
    objects: tokio::sync::RwLock<std::collections::HashMap<String, (String, Bytes)>>,
    base_url: String,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: tokio::sync::RwLock::new(std::collections::HashMap::new()),
            base_url: "http://memory.test".to_string(),
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Whether a key is present
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Fetch stored bytes, for assertions
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|(_, d)| d.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StoreResult<String> {
        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), (content_type.to_string(), data));
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        objects.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn sign(&self, key: &str, expires_in: Duration) -> StoreResult<String> {
        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!("{}?expires={}", self.public_url(key), expires))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// A store that fails every mutation, for exercising remote-failure paths
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put(&self, _key: &str, _content_type: &str, _data: Bytes) -> StoreResult<String> {
        Err(StoreError::BackendError("store unavailable".to_string()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::BackendError("store unavailable".to_string()))
    }

    async fn list(&self, _prefix: &str) -> StoreResult<Vec<String>> {
        Err(StoreError::BackendError("store unavailable".to_string()))
    }

    async fn sign(&self, _key: &str, _expires_in: Duration) -> StoreResult<String> {
        Err(StoreError::BackendError("store unavailable".to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://failing.test/{}", key)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// S3-compatible store configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "atlas-assets".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            path_style: false,
        }
    }
}

/// S3-compatible store (stub - requires aws-sdk-s3)
pub struct S3ObjectStore {
    config: S3Config,
    // In a real deployment, this would use aws-sdk-s3
}

impl S3ObjectStore {
    pub fn new(config: S3Config) -> Self {
        info!(bucket = %config.bucket, region = %config.region, "S3 store initialized");
        Self { config }
    }

    fn key_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.config.endpoint {
            if self.config.path_style {
                format!("{}/{}/{}", endpoint, self.config.bucket, key)
            } else {
                format!(
                    "https://{}.{}/{}",
                    self.config.bucket,
                    endpoint
                        .trim_start_matches("https://")
                        .trim_start_matches("http://"),
                    key
                )
            }
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, key
            )
        }
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.secret_access_key.as_bytes());
        hasher.update(key.as_bytes());
        hasher.update(expires.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, _key: &str, _content_type: &str, _data: Bytes) -> StoreResult<String> {
        // Stub implementation - would use aws-sdk-s3 in production
        error!("S3 store not fully implemented");
        Err(StoreError::BackendError("S3 not implemented".to_string()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        error!("S3 store not fully implemented");
        Err(StoreError::BackendError("S3 not implemented".to_string()))
    }

    async fn list(&self, _prefix: &str) -> StoreResult<Vec<String>> {
        error!("S3 store not fully implemented");
        Err(StoreError::BackendError("S3 not implemented".to_string()))
    }

    async fn sign(&self, key: &str, expires_in: Duration) -> StoreResult<String> {
        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        let signature = self.signature(key, expires);
        Ok(format!(
            "{}?X-Amz-Expires={}&X-Amz-Signature={}",
            self.key_url(key),
            expires_in.as_secs(),
            signature
        ))
    }

    fn public_url(&self, key: &str) -> String {
        self.key_url(key)
    }

    fn name(&self) -> &str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_put_returns_url() {
        let store = MemoryObjectStore::new();
        let url = store
            .put("units/1/profileImage/a.png", "image/png", Bytes::from("img"))
            .await
            .unwrap();

        assert_eq!(url, "http://memory.test/units/1/profileImage/a.png");
        assert!(store.contains("units/1/profileImage/a.png").await);
    }

    #[tokio::test]
    async fn test_memory_store_delete_is_idempotent() {
        let store = MemoryObjectStore::new();
        store
            .put("k.txt", "text/plain", Bytes::from("x"))
            .await
            .unwrap();

        store.delete("k.txt").await.unwrap();
        store.delete("k.txt").await.unwrap();
        assert!(!store.contains("k.txt").await);
    }

    #[tokio::test]
    async fn test_memory_store_list_by_prefix() {
        let store = MemoryObjectStore::new();
        for key in ["units/1/gallery/a.png", "units/1/gallery/b.png", "units/2/gallery/c.png"] {
            store.put(key, "image/png", Bytes::from("x")).await.unwrap();
        }

        let keys = store.list("units/1/gallery/").await.unwrap();
        assert_eq!(keys, vec!["units/1/gallery/a.png", "units/1/gallery/b.png"]);
    }

    #[tokio::test]
    async fn test_local_store_path_traversal() {
        let store = LocalObjectStore::temp().unwrap();

        let result = store.delete("../../../etc/passwd").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let store = LocalObjectStore::temp().unwrap();
        let key = format!("test/{}/file.txt", uuid::Uuid::new_v4());

        let url = store
            .put(&key, "text/plain", Bytes::from("hello"))
            .await
            .unwrap();
        assert!(url.ends_with(&key));

        let listed = store.list(&key[..key.len() - 8]).await.unwrap();
        assert_eq!(listed, vec![key.clone()]);

        store.delete(&key).await.unwrap();
        let listed = store.list(&key).await.unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_s3_public_url() {
        let store = S3ObjectStore::new(S3Config {
            bucket: "pictures".to_string(),
            region: "eu-central-1".to_string(),
            ..S3Config::default()
        });

        assert_eq!(
            store.public_url("units/1/gallery/a.png"),
            "https://pictures.s3.eu-central-1.amazonaws.com/units/1/gallery/a.png"
        );
    }

    #[tokio::test]
    async fn test_s3_sign_carries_expiry() {
        let store = S3ObjectStore::new(S3Config::default());
        let url = store
            .sign("k.png", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }
}
