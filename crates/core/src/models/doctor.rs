use super::{require, require_if_present, set_if_some, touched_at, Entity, Updatable};
use crate::storage::CollectionKind;
use crate::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Day of the week a doctor takes appointments. Serialised by full English name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| {
                day.name().eq_ignore_ascii_case(wanted)
                    || day.name()[..3].eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("unknown weekday '{wanted}'"))
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub qualification: String,
    /// Years of experience.
    pub experience: u32,
    pub consultation_fee: f64,
    #[serde(default)]
    pub availability: BTreeSet<Weekday>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub qualification: String,
    pub experience: u32,
    pub consultation_fee: f64,
    #[serde(default)]
    pub availability: BTreeSet<Weekday>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub availability: Option<BTreeSet<Weekday>>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_available_on(&self, day: Weekday) -> bool {
        self.availability.contains(&day)
    }

    /// Like [`Patient::matches_search`](super::Patient::matches_search), also matching the
    /// specialization.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.full_name().to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self.specialization.to_lowercase().contains(&needle)
            || self.phone.contains(term.trim())
    }
}

impl Entity for Doctor {
    type New = NewDoctor;
    const KIND: CollectionKind = CollectionKind::Doctors;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_new(new: &NewDoctor) -> StoreResult<()> {
        require("firstName", &new.first_name)?;
        require("lastName", &new.last_name)?;
        require("email", &new.email)?;
        require("phone", &new.phone)?;
        require("specialization", &new.specialization)?;
        require("qualification", &new.qualification)
    }

    fn from_new(id: String, now: DateTime<Utc>, new: NewDoctor) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            specialization: new.specialization,
            qualification: new.qualification,
            experience: new.experience,
            consultation_fee: new.consultation_fee,
            availability: new.availability,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Updatable for Doctor {
    type Patch = DoctorPatch;

    fn merge(&self, patch: DoctorPatch, now: DateTime<Utc>) -> StoreResult<Self> {
        require_if_present("firstName", patch.first_name.as_ref())?;
        require_if_present("lastName", patch.last_name.as_ref())?;
        require_if_present("email", patch.email.as_ref())?;
        require_if_present("phone", patch.phone.as_ref())?;
        require_if_present("specialization", patch.specialization.as_ref())?;
        require_if_present("qualification", patch.qualification.as_ref())?;

        let mut merged = self.clone();
        set_if_some(&mut merged.first_name, patch.first_name);
        set_if_some(&mut merged.last_name, patch.last_name);
        set_if_some(&mut merged.email, patch.email);
        set_if_some(&mut merged.phone, patch.phone);
        set_if_some(&mut merged.specialization, patch.specialization);
        set_if_some(&mut merged.qualification, patch.qualification);
        set_if_some(&mut merged.experience, patch.experience);
        set_if_some(&mut merged.consultation_fee, patch.consultation_fee);
        set_if_some(&mut merged.availability, patch.availability);
        merged.updated_at = touched_at(self.created_at, now);
        Ok(merged)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_doctor() -> NewDoctor {
        NewDoctor {
            first_name: "Emily".into(),
            last_name: "Carter".into(),
            email: "dr.carter@hospital.com".into(),
            phone: "+1-555-0201".into(),
            specialization: "General Medicine".into(),
            qualification: "MD, MBBS".into(),
            experience: 8,
            consultation_fee: 150.0,
            availability: [Weekday::Monday].into_iter().collect(),
        }
    }

    pub(crate) fn sample_doctor(id: &str) -> Doctor {
        Doctor::from_new(id.to_string(), Utc::now(), new_doctor())
    }

    #[test]
    fn test_availability_serialises_as_weekday_names() {
        let mut doctor = sample_doctor("d1");
        doctor.availability = [Weekday::Friday, Weekday::Monday].into_iter().collect();

        let value = serde_json::to_value(&doctor).unwrap();
        assert_eq!(value["availability"], serde_json::json!(["Monday", "Friday"]));
        assert_eq!(value["consultationFee"], 150.0);
        assert_eq!(value["experience"], 8);
    }

    #[test]
    fn test_availability_deduplicates_on_read() {
        let raw = r#"["Monday", "Monday", "Wednesday"]"#;
        let days: BTreeSet<Weekday> = serde_json::from_str(raw).unwrap();
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn test_weekday_from_str_accepts_short_and_long_names() {
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("Sat".parse::<Weekday>().unwrap(), Weekday::Saturday);
        assert!("Funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_matches_search_includes_specialization() {
        let doctor = sample_doctor("d1");
        assert!(doctor.matches_search("general"));
        assert!(doctor.matches_search("carter"));
        assert!(!doctor.matches_search("cardiology"));
    }

    #[test]
    fn test_validate_new_requires_qualification() {
        let mut new = new_doctor();
        new.qualification = String::new();
        assert!(Doctor::validate_new(&new).is_err());
    }

    #[test]
    fn test_merge_replaces_availability() {
        let base = sample_doctor("d1");
        let patch = DoctorPatch {
            availability: Some([Weekday::Tuesday, Weekday::Thursday].into_iter().collect()),
            ..Default::default()
        };

        let merged = base.merge(patch, Utc::now()).unwrap();
        assert!(merged.is_available_on(Weekday::Tuesday));
        assert!(!merged.is_available_on(Weekday::Monday));
        assert_eq!(merged.specialization, base.specialization);
    }
}
