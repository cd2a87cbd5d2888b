//! On-device key/value storage.
//!
//! Each key maps to a single file `<root>/<key>.json` holding the raw string value. Keys are
//! restricted to lowercase ASCII letters, digits and `_`, so a key can never escape the root
//! directory.
//!
//! ## Storage Layout
//!
//! ```text
//! hms_data/
//!   hms_patients.json          # JSON array of patients
//!   hms_doctors.json
//!   hms_appointments.json
//!   hms_medical_records.json
//!   hms_admin_auth.json
//!   patients_blob_id.json      # cached remote document ids (remote backend only)
//!   admin_session.json         # cached admin session
//! ```

use super::{CollectionKind, DocumentBackend};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// File-backed string key/value store.
#[derive(Clone, Debug)]
pub struct KeyValueStore {
    root: PathBuf,
}

impl KeyValueStore {
    /// Opens (creating if necessary) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageDirCreation`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(StoreError::StorageDirCreation)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'));
        if !valid {
            return Err(StoreError::InvalidStorageKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    /// Returns the value stored under `key`, or `None` if the key has never been set.
    pub fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::StorageRead(e)),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The value is written to a sibling temp file and renamed into place, so readers never see
    /// a half-written value. The temp file is removed if either step fails.
    pub fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        let result = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::StorageWrite(e));
        }
        Ok(())
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub fn remove_item(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::StorageWrite(e)),
        }
    }
}

/// Collection backend over [`KeyValueStore`].
///
/// Fully synchronous: the async trait methods complete without ever suspending. Write failures
/// are logged and swallowed, so mutations against the local store always report success.
#[derive(Clone, Debug)]
pub struct LocalBackend {
    kv: KeyValueStore,
}

impl LocalBackend {
    pub fn new(kv: KeyValueStore) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl DocumentBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn read(&self, kind: CollectionKind) -> StoreResult<Option<Value>> {
        let Some(raw) = self.kv.get_item(kind.storage_key())? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(StoreError::Deserialization)
    }

    async fn write(&self, kind: CollectionKind, document: Value) -> StoreResult<()> {
        let key = kind.storage_key();
        let result = serde_json::to_string(&document)
            .map_err(StoreError::Serialization)
            .and_then(|raw| self.kv.set_item(key, &raw));

        if let Err(e) = result {
            tracing::error!("error saving to local storage key {}: {}", key, e);
        }
        Ok(())
    }
}
