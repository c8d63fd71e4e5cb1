//! Durable client-side state: cart, wishlist and recently viewed products.
//!
//! Values are opaque JSON per [`StoreKey`]. Every mutation goes through
//! [`StateStore::update`], which runs its read-modify-write under the store's
//! writer lock so concurrent tasks never lose each other's changes.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rxstore_core::{Product, RecentlyViewed};
use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreKey {
    Cart,
    Wishlist,
    RecentlyViewed,
}

impl StoreKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::RecentlyViewed => "recently_viewed",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait StateStore: Send + Sync {
    fn read(
        &self,
        key: StoreKey,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    fn write(
        &self,
        key: StoreKey,
        value: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Applies `f` to the current value and stores its result atomically
    /// with respect to other writers. Returns the stored value.
    fn update<F>(
        &self,
        key: StoreKey,
        f: F,
    ) -> impl Future<Output = Result<Value, StoreError>> + Send
    where
        F: FnOnce(Option<Value>) -> Value + Send;

    fn clear(&self, key: StoreKey) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Process-local store, used in tests and when no state path is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<StoreKey, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    async fn read(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&key).cloned())
    }

    async fn write(&self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
        Ok(())
    }

    async fn update<F>(&self, key: StoreKey, f: F) -> Result<Value, StoreError>
    where
        F: FnOnce(Option<Value>) -> Value + Send,
    {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let next = f(values.remove(&key));
        values.insert(key, next.clone());
        Ok(next)
    }

    async fn clear(&self, key: StoreKey) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

/// All keys in one JSON document on disk. Writes go to a sibling temp file
/// that is then renamed over the document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    writer: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> Result<serde_json::Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    async fn save_document(&self, doc: &serde_json::Map<String, Value>) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)
    }
}

impl StateStore for JsonFileStore {
    async fn read(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        let mut doc = self.load_document().await?;
        Ok(doc.remove(key.as_str()))
    }

    async fn write(&self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        self.update(key, move |_| value).await.map(|_| ())
    }

    async fn update<F>(&self, key: StoreKey, f: F) -> Result<Value, StoreError>
    where
        F: FnOnce(Option<Value>) -> Value + Send,
    {
        let _guard = self.writer.lock().await;
        let mut doc = self.load_document().await?;
        let next = f(doc.remove(key.as_str()));
        doc.insert(key.as_str().to_owned(), next.clone());
        self.save_document(&doc).await?;
        Ok(next)
    }

    async fn clear(&self, key: StoreKey) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;
        let mut doc = self.load_document().await?;
        if doc.remove(key.as_str()).is_some() {
            self.save_document(&doc).await?;
        }
        Ok(())
    }
}

fn decode_recent(value: Option<Value>) -> Result<RecentlyViewed, StoreError> {
    match value {
        None | Some(Value::Null) => Ok(RecentlyViewed::default()),
        Some(v) => serde_json::from_value(v).map_err(|source| StoreError::Shape {
            key: StoreKey::RecentlyViewed.as_str(),
            source,
        }),
    }
}

/// Reads the recently viewed list; a missing entry is an empty list.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read or holds a value that
/// is not a recently viewed list.
pub async fn load_recently_viewed<S: StateStore>(store: &S) -> Result<RecentlyViewed, StoreError> {
    decode_recent(store.read(StoreKey::RecentlyViewed).await?)
}

/// Records a product view at `path` and returns the updated list. A stored
/// value that fails to decode is replaced rather than blocking new views.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read or written.
pub async fn record_recently_viewed<S: StateStore>(
    store: &S,
    product: &Product,
    path: &str,
) -> Result<RecentlyViewed, StoreError> {
    let viewed_at = Utc::now();
    let stored = store
        .update(StoreKey::RecentlyViewed, |current| {
            let mut recent = decode_recent(current).unwrap_or_default();
            recent.record(product, path, viewed_at);
            serde_json::to_value(&recent).unwrap_or(Value::Null)
        })
        .await?;
    decode_recent(Some(stored))
}
