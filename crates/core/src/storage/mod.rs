//! Backing resources for the entity collections.
//!
//! Both backends expose the same primitive: read a whole collection document, or replace it.
//! Neither offers partial updates, which is why the collection layer works by
//! whole-collection read-modify-write.
//!
//! - [`local`]: on-device key/value storage, one file per key.
//! - [`jsonblob`]: HTTP client for the remote JSON-blob service.
//! - [`registry`]: cached blob document ids and the startup bootstrap that creates them.
//! - [`remote`]: the backend that routes collection reads/writes through the registry.

pub mod jsonblob;
pub mod local;
pub mod registry;
pub mod remote;

use crate::constants::{
    ADMIN_AUTH_KEY, APPOINTMENTS_KEY, BLOB_ID_KEY_SUFFIX, DOCTORS_KEY, MEDICAL_RECORDS_KEY,
    PATIENTS_KEY,
};
use crate::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub use jsonblob::JsonBlobClient;
pub use local::{KeyValueStore, LocalBackend};
pub use registry::{BlobIdRegistry, BootstrapReport};
pub use remote::RemoteBackend;

/// The five logical collections persisted by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    Patients,
    Doctors,
    Appointments,
    MedicalRecords,
    AdminAuth,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::Patients,
        CollectionKind::Doctors,
        CollectionKind::Appointments,
        CollectionKind::MedicalRecords,
        CollectionKind::AdminAuth,
    ];

    /// Short snake_case name, also used to derive the blob id key.
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Patients => "patients",
            CollectionKind::Doctors => "doctors",
            CollectionKind::Appointments => "appointments",
            CollectionKind::MedicalRecords => "medical_records",
            CollectionKind::AdminAuth => "admin_auth",
        }
    }

    /// Local storage key holding this collection's JSON array.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKind::Patients => PATIENTS_KEY,
            CollectionKind::Doctors => DOCTORS_KEY,
            CollectionKind::Appointments => APPOINTMENTS_KEY,
            CollectionKind::MedicalRecords => MEDICAL_RECORDS_KEY,
            CollectionKind::AdminAuth => ADMIN_AUTH_KEY,
        }
    }

    /// Local storage key caching this collection's remote document id.
    pub fn blob_id_key(&self) -> String {
        format!("{}{}", self.name(), BLOB_ID_KEY_SUFFIX)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whole-document access to a collection's backing resource.
///
/// `read` returns `Ok(None)` when the resource does not exist yet (never written, or no remote
/// document allocated). Implementations decide which write failures reach the caller; see
/// [`LocalBackend`] and [`RemoteBackend`].
#[async_trait]
pub trait DocumentBackend: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn read(&self, kind: CollectionKind) -> StoreResult<Option<Value>>;

    async fn write(&self, kind: CollectionKind, document: Value) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_storage_keys_match_persisted_names() {
        assert_eq!(CollectionKind::Patients.storage_key(), "hms_patients");
        assert_eq!(
            CollectionKind::MedicalRecords.storage_key(),
            "hms_medical_records"
        );
    }

    #[test]
    fn test_blob_id_keys() {
        assert_eq!(CollectionKind::Patients.blob_id_key(), "patients_blob_id");
        assert_eq!(
            CollectionKind::MedicalRecords.blob_id_key(),
            "medical_records_blob_id"
        );
        assert_eq!(CollectionKind::AdminAuth.blob_id_key(), "admin_auth_blob_id");
    }

    #[test]
    fn test_keys_are_distinct() {
        let mut keys = HashSet::new();
        for kind in CollectionKind::ALL {
            assert!(keys.insert(kind.storage_key().to_string()));
            assert!(keys.insert(kind.blob_id_key()));
        }
    }
}
