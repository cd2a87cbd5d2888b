use super::{require, require_if_present, set_if_some, touched_at, Entity, Updatable};
use crate::storage::CollectionKind;
use crate::StoreResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        })
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub emergency_phone: String,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medical_history: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub emergency_phone: String,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medical_history: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match on full name or email, substring match on phone.
    ///
    /// An empty term matches every patient.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.full_name().to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self.phone.contains(term.trim())
    }
}

impl Entity for Patient {
    type New = NewPatient;
    const KIND: CollectionKind = CollectionKind::Patients;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_new(new: &NewPatient) -> StoreResult<()> {
        require("firstName", &new.first_name)?;
        require("lastName", &new.last_name)?;
        require("email", &new.email)?;
        require("phone", &new.phone)
    }

    fn from_new(id: String, now: DateTime<Utc>, new: NewPatient) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            address: new.address,
            emergency_contact: new.emergency_contact,
            emergency_phone: new.emergency_phone,
            blood_group: new.blood_group,
            allergies: new.allergies,
            medical_history: new.medical_history,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Updatable for Patient {
    type Patch = PatientPatch;

    fn merge(&self, patch: PatientPatch, now: DateTime<Utc>) -> StoreResult<Self> {
        require_if_present("firstName", patch.first_name.as_ref())?;
        require_if_present("lastName", patch.last_name.as_ref())?;
        require_if_present("email", patch.email.as_ref())?;
        require_if_present("phone", patch.phone.as_ref())?;

        let mut merged = self.clone();
        set_if_some(&mut merged.first_name, patch.first_name);
        set_if_some(&mut merged.last_name, patch.last_name);
        set_if_some(&mut merged.email, patch.email);
        set_if_some(&mut merged.phone, patch.phone);
        set_if_some(&mut merged.date_of_birth, patch.date_of_birth);
        set_if_some(&mut merged.gender, patch.gender);
        set_if_some(&mut merged.address, patch.address);
        set_if_some(&mut merged.emergency_contact, patch.emergency_contact);
        set_if_some(&mut merged.emergency_phone, patch.emergency_phone);
        set_if_some(&mut merged.blood_group, patch.blood_group);
        set_if_some(&mut merged.allergies, patch.allergies);
        set_if_some(&mut merged.medical_history, patch.medical_history);
        merged.updated_at = touched_at(self.created_at, now);
        Ok(merged)
    }
}
