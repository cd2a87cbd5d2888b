//! The generic collection contract.
//!
//! A collection is a JSON array of records stored as one document in a [`DocumentBackend`].
//! Every mutation reads the whole array, changes it in memory and writes the whole array back.
//! There is no locking: two interleaved mutations can lose one of the updates.
//!
//! ## Failure semantics
//!
//! - Reads never fail. An unreadable or unparseable document is logged and treated as an empty
//!   collection. A single element that does not decode as a record is logged and skipped.
//! - Mutations decode and re-encode only the record they touch. Every other element is written
//!   back exactly as it was read, so records from older clients survive.
//! - Not-found is a value: `update` returns `Ok(None)` and `delete` returns `Ok(false)`.
//! - Write failures reach the caller only if the backend surfaces them (the remote backend does,
//!   the local backend logs and swallows them).

use crate::models::{Appointment, Entity, FieldLookup, MedicalRecord, Updatable};
use crate::storage::{CollectionKind, DocumentBackend};
use crate::{StoreError, StoreResult};
use chrono::Utc;
use hms_uuid::RecordId;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// ============================================================================
// DOCUMENT (DE)SERIALISATION
// ============================================================================

/// Reads collection `kind` as raw elements, one JSON value per stored record.
///
/// A document that has never been written (or holds `null`) has no elements.
///
/// # Errors
///
/// Returns an error if the backend read fails or the document is not a JSON array.
async fn load_elements(
    backend: &dyn DocumentBackend,
    kind: CollectionKind,
) -> StoreResult<Vec<Value>> {
    match backend.read(kind).await? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(document) => serde_json::from_value(document).map_err(StoreError::Deserialization),
    }
}

fn element_id(element: &Value) -> Option<&str> {
    element.get("id").and_then(Value::as_str)
}

/// Reads collection `kind` and decodes it into records.
///
/// Elements that do not decode as `T` are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the backend read fails or the document is not a JSON array.
pub async fn load_collection<T: DeserializeOwned>(
    backend: &dyn DocumentBackend,
    kind: CollectionKind,
) -> StoreResult<Vec<T>> {
    let elements = load_elements(backend, kind).await?;
    let records = elements
        .iter()
        .filter_map(|element| match T::deserialize(element) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    "skipping undecodable {} record {}: {}",
                    kind,
                    element_id(element).unwrap_or("<no id>"),
                    e
                );
                None
            }
        })
        .collect();
    Ok(records)
}

/// Encodes `records` and replaces collection `kind` with them.
pub async fn save_collection<T: Serialize>(
    backend: &dyn DocumentBackend,
    kind: CollectionKind,
    records: &[T],
) -> StoreResult<()> {
    let document = serde_json::to_value(records).map_err(StoreError::Serialization)?;
    backend.write(kind, document).await
}

// ============================================================================
// COLLECTION
// ============================================================================

/// CRUD access to the collection of `T` records.
pub struct Collection<T> {
    backend: Arc<dyn DocumentBackend>,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            _records: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &T::KIND)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            _records: PhantomData,
        }
    }

    /// Every record in stored order. Read failures yield an empty vec.
    pub async fn get_all(&self) -> Vec<T> {
        match load_collection(self.backend.as_ref(), T::KIND).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "failed to load {} from {} backend: {}",
                    T::KIND,
                    self.backend.name(),
                    e
                );
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Option<T> {
        self.get_all().await.into_iter().find(|r| r.id() == id)
    }

    /// Records matching `predicate`, in stored order.
    pub async fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.get_all()
            .await
            .into_iter()
            .filter(|r| predicate(r))
            .collect()
    }

    /// Replaces the whole collection with `records`.
    pub async fn replace_all(&self, records: &[T]) -> StoreResult<()> {
        save_collection(self.backend.as_ref(), T::KIND, records).await
    }

    /// Raw stored elements. Read failures yield an empty vec.
    async fn elements(&self) -> Vec<Value> {
        match load_elements(self.backend.as_ref(), T::KIND).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!(
                    "failed to load {} from {} backend: {}",
                    T::KIND,
                    self.backend.name(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn write_elements(&self, elements: Vec<Value>) -> StoreResult<()> {
        self.backend.write(T::KIND, Value::Array(elements)).await
    }

    /// Validates `new`, assigns a fresh id and timestamps, and appends the record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] if a required field is blank; nothing is read or written.
    /// - Any write error the backend surfaces.
    pub async fn create(&self, new: T::New) -> StoreResult<T> {
        T::validate_new(&new)?;

        let mut elements = self.elements().await;
        let mut id = RecordId::new().to_string();
        while elements.iter().any(|e| element_id(e) == Some(id.as_str())) {
            id = RecordId::new().to_string();
        }

        let record = T::from_new(id, Utc::now(), new);
        elements.push(serde_json::to_value(&record).map_err(StoreError::Serialization)?);
        self.write_elements(elements).await?;

        tracing::debug!("created {} record {}", T::KIND, record.id());
        Ok(record)
    }

    /// Removes the record with `id`. Returns `Ok(false)` without writing when it does not exist.
    ///
    /// A stored element with a matching id is removed even if it no longer decodes as `T`.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut elements = self.elements().await;
        let Some(index) = elements.iter().position(|e| element_id(e) == Some(id)) else {
            return Ok(false);
        };

        elements.remove(index);
        self.write_elements(elements).await?;

        tracing::debug!("deleted {} record {}", T::KIND, id);
        Ok(true)
    }
}

impl<T: Updatable> Collection<T> {
    /// Applies `patch` to the record with `id` and stamps `updatedAt`.
    ///
    /// Returns `Ok(None)` without writing when no record has `id`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Deserialization`] if the stored element with `id` does not decode as `T`.
    /// - [`StoreError::InvalidTransition`] if the patch breaks an entity rule.
    /// - Any write error the backend surfaces.
    pub async fn update(&self, id: &str, patch: T::Patch) -> StoreResult<Option<T>> {
        let mut elements = self.elements().await;
        let Some(index) = elements.iter().position(|e| element_id(e) == Some(id)) else {
            return Ok(None);
        };

        let stored = T::deserialize(&elements[index]).map_err(StoreError::Deserialization)?;
        let merged = stored.merge(patch, Utc::now())?;
        elements[index] = serde_json::to_value(&merged).map_err(StoreError::Serialization)?;
        self.write_elements(elements).await?;

        tracing::debug!("updated {} record {}", T::KIND, id);
        Ok(Some(merged))
    }
}

impl<T: FieldLookup> Collection<T> {
    /// Records whose `field` equals `value`, in stored order.
    pub async fn get_by_field(&self, field: T::Field, value: &str) -> Vec<T> {
        self.filter(|r| r.field_value(field) == value).await
    }
}

impl Collection<Appointment> {
    pub async fn get_by_patient_id(&self, patient_id: &str) -> Vec<Appointment> {
        self.get_by_field(crate::models::AppointmentField::PatientId, patient_id)
            .await
    }

    pub async fn get_by_doctor_id(&self, doctor_id: &str) -> Vec<Appointment> {
        self.get_by_field(crate::models::AppointmentField::DoctorId, doctor_id)
            .await
    }
}

impl Collection<MedicalRecord> {
    pub async fn get_by_patient_id(&self, patient_id: &str) -> Vec<MedicalRecord> {
        self.get_by_field(crate::models::MedicalRecordField::PatientId, patient_id)
            .await
    }
}
