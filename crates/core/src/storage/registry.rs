//! Cached blob document ids and the startup bootstrap.
//!
//! Each collection lives in its own remote document. The document ids are opaque strings
//! handed out by the blob service, so they are cached in local storage under
//! `<collection>_blob_id` and survive restarts.
//!
//! [`BlobIdRegistry::bootstrap`] allocates a document for every collection that has no cached
//! id yet. It is meant to run once at startup without blocking the caller; a read that races
//! ahead of it simply sees an empty collection.

use super::{CollectionKind, JsonBlobClient, KeyValueStore};
use crate::StoreResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Outcome of a bootstrap pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Collections that received a new document in this pass.
    pub created: Vec<CollectionKind>,
    /// Collections whose document could not be created; retried on the next pass.
    pub failed: Vec<CollectionKind>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-collection remote document ids, backed by local storage.
#[derive(Debug)]
pub struct BlobIdRegistry {
    kv: KeyValueStore,
    ids: RwLock<HashMap<CollectionKind, String>>,
}

impl BlobIdRegistry {
    /// Loads every cached id from `kv`. Unreadable or blank entries count as missing.
    pub fn load(kv: KeyValueStore) -> Self {
        let mut ids = HashMap::new();
        for kind in CollectionKind::ALL {
            match kv.get_item(&kind.blob_id_key()) {
                Ok(Some(id)) if !id.trim().is_empty() => {
                    ids.insert(kind, id.trim().to_string());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("failed to read cached blob id for {}: {}", kind, e),
            }
        }

        Self {
            kv,
            ids: RwLock::new(ids),
        }
    }

    /// The cached document id for `kind`, if one has been allocated.
    pub fn document_id(&self, kind: CollectionKind) -> Option<String> {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    /// Collections that still need a document.
    pub fn missing(&self) -> Vec<CollectionKind> {
        let ids = self.ids.read().unwrap_or_else(PoisonError::into_inner);
        CollectionKind::ALL
            .into_iter()
            .filter(|kind| !ids.contains_key(kind))
            .collect()
    }

    /// Records `id` for `kind` in memory and in local storage.
    ///
    /// The in-memory entry is kept even if persisting fails, so the current process can still
    /// reach the document.
    pub fn remember(&self, kind: CollectionKind, id: &str) -> StoreResult<()> {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, id.to_string());
        self.kv.set_item(&kind.blob_id_key(), id)
    }

    /// Creates an empty-array document for every collection without a cached id.
    ///
    /// Failures are logged per collection and do not stop the remaining collections.
    pub async fn bootstrap(&self, client: &JsonBlobClient) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        for kind in self.missing() {
            match client.create_document(&Value::Array(Vec::new())).await {
                Ok(id) => {
                    if let Err(e) = self.remember(kind, &id) {
                        tracing::warn!("failed to cache blob id for {}: {}", kind, e);
                    }
                    tracing::info!("++ Created blob document {} for {}", id, kind);
                    report.created.push(kind);
                }
                Err(e) => {
                    tracing::error!("failed to initialise blob for {}: {}", kind, e);
                    report.failed.push(kind);
                }
            }
        }

        report
    }
}
