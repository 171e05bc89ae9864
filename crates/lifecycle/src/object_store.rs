//! Blob storage used by Phase 1 of club deletion.
//!
//! Deletion is idempotent: removing a key that does not exist succeeds.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("I/O error deleting '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store backend error for '{key}': {message}")]
    Backend { key: String, message: String },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Remove the object stored under `key`.
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreBackend {
    Local { root: PathBuf },
    S3 { bucket: String },
}

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub backend: ObjectStoreBackend,
}

impl ObjectStoreConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `OBJECT_STORE_BACKEND` | `local` (`local` or `s3`)  |
    /// | `OBJECT_STORE_ROOT`    | `./storage`                |
    /// | `S3_BUCKET`            | required when backend = s3 |
    pub fn from_env() -> Self {
        let backend = std::env::var("OBJECT_STORE_BACKEND").unwrap_or_else(|_| "local".into());
        let backend = match backend.to_ascii_lowercase().as_str() {
            "local" => ObjectStoreBackend::Local {
                root: std::env::var("OBJECT_STORE_ROOT")
                    .unwrap_or_else(|_| "./storage".into())
                    .into(),
            },
            "s3" => ObjectStoreBackend::S3 {
                bucket: std::env::var("S3_BUCKET")
                    .expect("S3_BUCKET must be set when OBJECT_STORE_BACKEND=s3"),
            },
            other => panic!("OBJECT_STORE_BACKEND must be 'local' or 's3', got '{other}'"),
        };
        Self { backend }
    }

    /// Construct the configured backend. The S3 client picks up credentials
    /// and region from the standard AWS environment.
    pub async fn build(&self) -> Arc<dyn ObjectStore> {
        match &self.backend {
            ObjectStoreBackend::Local { root } => Arc::new(LocalObjectStore::new(root.clone())),
            ObjectStoreBackend::S3 { bucket } => {
                let sdk_config =
                    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let client = aws_sdk_s3::Client::new(&sdk_config);
                Arc::new(S3ObjectStore::new(client, bucket.clone()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        // S3 answers 204 for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend {
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;
        tracing::debug!(bucket = %self.bucket, key, "Deleted S3 object");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

/// Objects stored as files under a root directory, keyed by relative path.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root. Absolute keys and keys that
    /// climb out of the root are rejected.
    fn resolve(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ObjectStoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps keys in a set. Individual keys can be made to fail.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeSet<String>>,
    failing: Mutex<BTreeSet<String>>,
    attempts: Mutex<Vec<String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str) {
        lock(&self.objects).insert(key.to_string());
    }

    /// Every later delete of `key` fails with a backend error.
    pub fn fail_on(&self, key: &str) {
        lock(&self.failing).insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains(key)
    }

    /// Keys passed to `delete_object`, in call order, including failures.
    pub fn attempts(&self) -> Vec<String> {
        lock(&self.attempts).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        lock(&self.attempts).push(key.to_string());
        if lock(&self.failing).contains(key) {
            return Err(ObjectStoreError::Backend {
                key: key.to_string(),
                message: "injected failure".into(),
            });
        }
        lock(&self.objects).remove(key);
        Ok(())
    }
}
