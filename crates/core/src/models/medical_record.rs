use super::{require, Entity, FieldLookup};
use crate::storage::CollectionKind;
use crate::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vital signs as entered, free text with units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vitals {
    pub blood_pressure: String,
    pub heart_rate: String,
    pub temperature: String,
    pub weight: String,
    pub height: String,
}

/// A clinical note for one visit. Records are append-only: there is no patch type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub appointment_id: String,
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub vitals: Vitals,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub patient_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub appointment_id: String,
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub vitals: Vitals,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MedicalRecordField {
    PatientId,
    DoctorId,
    AppointmentId,
}

impl Entity for MedicalRecord {
    type New = NewMedicalRecord;
    const KIND: CollectionKind = CollectionKind::MedicalRecords;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_new(new: &NewMedicalRecord) -> StoreResult<()> {
        require("patientId", &new.patient_id)?;
        require("doctorId", &new.doctor_id)?;
        require("diagnosis", &new.diagnosis)
    }

    fn from_new(id: String, now: DateTime<Utc>, new: NewMedicalRecord) -> Self {
        Self {
            id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            appointment_id: new.appointment_id,
            diagnosis: new.diagnosis,
            prescription: new.prescription,
            notes: new.notes,
            vitals: new.vitals,
            created_at: now,
        }
    }
}

impl FieldLookup for MedicalRecord {
    type Field = MedicalRecordField;

    fn field_value(&self, field: MedicalRecordField) -> &str {
        match field {
            MedicalRecordField::PatientId => &self.patient_id,
            MedicalRecordField::DoctorId => &self.doctor_id,
            MedicalRecordField::AppointmentId => &self.appointment_id,
        }
    }
}
