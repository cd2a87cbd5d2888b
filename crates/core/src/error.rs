use crate::models::AppointmentStatus;
use crate::storage::CollectionKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {0}")]
    Validation(#[from] hms_types::TextError),
    #[error("invalid appointment status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidStorageKey(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read from local storage: {0}")]
    StorageRead(std::io::Error),
    #[error("failed to write to local storage: {0}")]
    StorageWrite(std::io::Error),
    #[error("failed to serialize collection: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize collection: {0}")]
    Deserialization(serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("blob service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("blob service returned status {status}")]
    RemoteStatus { status: u16 },
    #[error("blob service response has no usable Location header")]
    MissingLocation,
    #[error("no blob document id cached for {0}")]
    MissingDocumentId(CollectionKind),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
