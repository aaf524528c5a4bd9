use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{ObjectStore, PutOptions};
use crate::error::{CatalogError, Result};

/// An object held by [`MemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub options: PutOptions,
}

/// In-process bucket used by tests and local development
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    name: String,
    objects: RwLock<HashMap<String, StoredObject>>,
    reject_writes: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Make every following write fail, like an unreachable bucket
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(CatalogError::Upload(format!(
                "Bucket {} rejected write to {}",
                self.name, key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn put_file(&self, path: &Path, key: &str, options: &PutOptions) -> Result<()> {
        self.check_writable(key)?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CatalogError::Upload(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.put_bytes(bytes, key, options).await
    }

    async fn put_bytes(&self, bytes: Vec<u8>, key: &str, options: &PutOptions) -> Result<()> {
        self.check_writable(key)?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                options: options.clone(),
            },
        );
        Ok(())
    }

    async fn download_to(&self, key: &str, destination: &Path) -> Result<()> {
        let object = self
            .get(key)
            .await
            .ok_or_else(|| CatalogError::Upload(format!("No such object in {}: {}", self.name, key)))?;
        tokio::fs::write(destination, &object.bytes).await?;
        Ok(())
    }
}
