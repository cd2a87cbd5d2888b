use super::{
    require, require_if_present, set_if_some, touched_at, Entity, FieldLookup, Updatable,
};
use crate::storage::CollectionKind;
use crate::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentType {
    Consultation,
    Followup,
    Emergency,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppointmentType::Consultation => "consultation",
            AppointmentType::Followup => "followup",
            AppointmentType::Emergency => "emergency",
        })
    }
}

impl FromStr for AppointmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consultation" => Ok(AppointmentType::Consultation),
            "followup" | "follow-up" => Ok(AppointmentType::Followup),
            "emergency" => Ok(AppointmentType::Emergency),
            other => Err(format!("unknown appointment type '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    /// Whether an appointment in `self` may move to `next`.
    ///
    /// Only a scheduled appointment changes status. Restating the current status is allowed.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self == next || self == AppointmentStatus::Scheduled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        })
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    /// Wall-clock slot as entered, e.g. `"10:00"`.
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking input. New appointments always start out scheduled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    #[serde(default)]
    pub notes: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Reference fields an appointment can be looked up by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentField {
    PatientId,
    DoctorId,
}

impl Entity for Appointment {
    type New = NewAppointment;
    const KIND: CollectionKind = CollectionKind::Appointments;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_new(new: &NewAppointment) -> StoreResult<()> {
        require("patientId", &new.patient_id)?;
        require("doctorId", &new.doctor_id)?;
        require("time", &new.time)
    }

    fn from_new(id: String, now: DateTime<Utc>, new: NewAppointment) -> Self {
        Self {
            id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            date: new.date,
            time: new.time,
            appointment_type: new.appointment_type,
            status: AppointmentStatus::Scheduled,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Updatable for Appointment {
    type Patch = AppointmentPatch;

    fn merge(&self, patch: AppointmentPatch, now: DateTime<Utc>) -> StoreResult<Self> {
        require_if_present("patientId", patch.patient_id.as_ref())?;
        require_if_present("doctorId", patch.doctor_id.as_ref())?;
        require_if_present("time", patch.time.as_ref())?;
        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                return Err(StoreError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
        }

        let mut merged = self.clone();
        set_if_some(&mut merged.patient_id, patch.patient_id);
        set_if_some(&mut merged.doctor_id, patch.doctor_id);
        set_if_some(&mut merged.date, patch.date);
        set_if_some(&mut merged.time, patch.time);
        set_if_some(&mut merged.appointment_type, patch.appointment_type);
        set_if_some(&mut merged.status, patch.status);
        set_if_some(&mut merged.notes, patch.notes);
        merged.updated_at = touched_at(self.created_at, now);
        Ok(merged)
    }
}

impl FieldLookup for Appointment {
    type Field = AppointmentField;

    fn field_value(&self, field: AppointmentField) -> &str {
        match field {
            AppointmentField::PatientId => &self.patient_id,
            AppointmentField::DoctorId => &self.doctor_id,
        }
    }
}
