use super::{BlobIdRegistry, BootstrapReport, CollectionKind, DocumentBackend, JsonBlobClient};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Collection backend over the JSON-blob service.
///
/// Reads of a collection whose document has not been allocated yet return `Ok(None)`. Writes
/// surface every failure (no cached id, transport error, non-2xx status) to the caller.
#[derive(Clone, Debug)]
pub struct RemoteBackend {
    client: Arc<JsonBlobClient>,
    registry: Arc<BlobIdRegistry>,
}

impl RemoteBackend {
    pub fn new(client: Arc<JsonBlobClient>, registry: Arc<BlobIdRegistry>) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &BlobIdRegistry {
        &self.registry
    }

    /// Runs the document bootstrap to completion.
    pub async fn bootstrap(&self) -> BootstrapReport {
        self.registry.bootstrap(&self.client).await
    }

    /// Starts the document bootstrap in the background and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_bootstrap(&self) -> JoinHandle<BootstrapReport> {
        let client = self.client.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move { registry.bootstrap(&client).await })
    }
}

#[async_trait]
impl DocumentBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn read(&self, kind: CollectionKind) -> StoreResult<Option<Value>> {
        let Some(id) = self.registry.document_id(kind) else {
            return Ok(None);
        };
        self.client.read_document(&id).await.map(Some)
    }

    async fn write(&self, kind: CollectionKind, document: Value) -> StoreResult<()> {
        let id = self
            .registry
            .document_id(kind)
            .ok_or(StoreError::MissingDocumentId(kind))?;
        self.client.replace_document(&id, &document).await
    }
}
