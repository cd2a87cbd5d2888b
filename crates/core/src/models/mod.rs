//! Record types stored in the entity collections.
//!
//! Each updatable entity comes in three shapes:
//!
//! - the stored record (`Patient`), with id and timestamps;
//! - the create input (`NewPatient`), without id or timestamps;
//! - the patch (`PatientPatch`), every field optional.
//!
//! Patches are applied by a pure merge: fields present in the patch override the stored record,
//! `id` and `createdAt` are never patchable, and `updatedAt` is stamped by the store.
//!
//! Wire field names are camelCase to stay compatible with collections written by the browser
//! client.

pub mod admin;
pub mod appointment;
pub mod doctor;
pub mod medical_record;
pub mod patient;

pub use admin::{AdminCredential, AdminSession, NewAdminCredential};
pub use appointment::{
    Appointment, AppointmentField, AppointmentPatch, AppointmentStatus, AppointmentType,
    NewAppointment,
};
pub use doctor::{Doctor, DoctorPatch, NewDoctor, Weekday};
pub use medical_record::{MedicalRecord, MedicalRecordField, NewMedicalRecord, Vitals};
pub use patient::{Gender, NewPatient, Patient, PatientPatch};

use crate::storage::CollectionKind;
use crate::StoreResult;
use chrono::{DateTime, Utc};
use hms_types::NonEmptyText;
use serde::{de::DeserializeOwned, Serialize};

/// A record type persisted as one element of a collection document.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Create input: every field except id and timestamps.
    type New: Send;

    /// Collection this entity is stored in.
    const KIND: CollectionKind;

    fn id(&self) -> &str;

    /// Required-field check run before any storage I/O.
    fn validate_new(new: &Self::New) -> StoreResult<()>;

    /// Builds the stored record from create input, stamping every timestamp with `now`.
    fn from_new(id: String, now: DateTime<Utc>, new: Self::New) -> Self;
}

/// An entity that supports partial updates.
pub trait Updatable: Entity {
    type Patch: Send;

    /// Returns `self` with `patch` applied and `updatedAt` set from `now`.
    ///
    /// Pure: the stored record is not touched; the caller persists the result.
    fn merge(&self, patch: Self::Patch, now: DateTime<Utc>) -> StoreResult<Self>;
}

/// An entity with weak references to other collections that can be filtered on.
pub trait FieldLookup: Entity {
    type Field: Copy + Send + Sync;

    fn field_value(&self, field: Self::Field) -> &str;
}

/// `updatedAt` for a record created at `created_at`, never earlier than creation.
pub(crate) fn touched_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(created_at)
}

pub(crate) fn require(field: &'static str, value: &str) -> StoreResult<()> {
    NonEmptyText::require(field, value)?;
    Ok(())
}

pub(crate) fn require_if_present(field: &'static str, value: Option<&String>) -> StoreResult<()> {
    match value {
        Some(value) => require(field, value),
        None => Ok(()),
    }
}

pub(crate) fn set_if_some<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// `"First Last"` for the patient with `id`, or `"Unknown Patient"` for a dangling reference.
pub fn patient_display_name(patients: &[Patient], id: &str) -> String {
    patients
        .iter()
        .find(|p| p.id == id)
        .map(Patient::full_name)
        .unwrap_or_else(|| "Unknown Patient".to_string())
}

/// `"Dr. First Last"` for the doctor with `id`, or `"Unknown Doctor"` for a dangling reference.
pub fn doctor_display_name(doctors: &[Doctor], id: &str) -> String {
    doctors
        .iter()
        .find(|d| d.id == id)
        .map(|d| format!("Dr. {}", d.full_name()))
        .unwrap_or_else(|| "Unknown Doctor".to_string())
}
