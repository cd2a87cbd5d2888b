//! Listing filters for the appointment and medical record views.
//!
//! Search terms are matched case-insensitively against the display names of the referenced
//! patient and doctor, so a dangling reference matches as "Unknown Patient" / "Unknown Doctor".

use crate::models::{
    doctor_display_name, patient_display_name, Appointment, AppointmentStatus, Doctor,
    MedicalRecord, Patient,
};
use chrono::NaiveTime;
use std::cmp::Reverse;

fn normalised(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Criteria for listing appointments. The default matches every appointment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppointmentFilter {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// Matched against patient name, doctor name and appointment type.
    pub search: Option<String>,
}

impl AppointmentFilter {
    pub fn matches(
        &self,
        appointment: &Appointment,
        patients: &[Patient],
        doctors: &[Doctor],
    ) -> bool {
        if self.patient_id.as_ref().is_some_and(|id| *id != appointment.patient_id)
            || self.doctor_id.as_ref().is_some_and(|id| *id != appointment.doctor_id)
            || self.status.is_some_and(|s| s != appointment.status)
        {
            return false;
        }

        let Some(term) = normalised(self.search.as_deref()) else {
            return true;
        };
        patient_display_name(patients, &appointment.patient_id)
            .to_lowercase()
            .contains(&term)
            || doctor_display_name(doctors, &appointment.doctor_id)
                .to_lowercase()
                .contains(&term)
            || appointment.appointment_type.to_string().contains(&term)
    }

    /// Matching appointments, newest first by date and time.
    pub fn apply(
        &self,
        appointments: Vec<Appointment>,
        patients: &[Patient],
        doctors: &[Doctor],
    ) -> Vec<Appointment> {
        let mut matched: Vec<Appointment> = appointments
            .into_iter()
            .filter(|a| self.matches(a, patients, doctors))
            .collect();
        sort_newest_first(&mut matched);
        matched
    }
}

/// Sorts by date then time of day, latest first. Unparseable times sort before valid ones on
/// the same date; ties keep stored order.
pub fn sort_newest_first(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| {
        Reverse((a.date, NaiveTime::parse_from_str(a.time.trim(), "%H:%M").ok()))
    });
}

/// Criteria for listing medical records. The default matches every record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MedicalRecordFilter {
    pub patient_id: Option<String>,
    /// Matched against patient name, doctor name and notes.
    pub search: Option<String>,
}

impl MedicalRecordFilter {
    pub fn matches(
        &self,
        record: &MedicalRecord,
        patients: &[Patient],
        doctors: &[Doctor],
    ) -> bool {
        if self.patient_id.as_ref().is_some_and(|id| *id != record.patient_id) {
            return false;
        }

        let Some(term) = normalised(self.search.as_deref()) else {
            return true;
        };
        patient_display_name(patients, &record.patient_id)
            .to_lowercase()
            .contains(&term)
            || doctor_display_name(doctors, &record.doctor_id)
                .to_lowercase()
                .contains(&term)
            || record.notes.to_lowercase().contains(&term)
    }

    /// Matching records in stored order.
    pub fn apply(
        &self,
        records: Vec<MedicalRecord>,
        patients: &[Patient],
        doctors: &[Doctor],
    ) -> Vec<MedicalRecord> {
        records
            .into_iter()
            .filter(|r| self.matches(r, patients, doctors))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::tests::new_appointment;
    use crate::models::doctor::tests::sample_doctor;
    use crate::models::medical_record::tests::new_record;
    use crate::models::patient::tests::sample_patient;
    use crate::models::{AppointmentType, Entity};
    use chrono::{NaiveDate, Utc};

    fn appointment(
        id: &str,
        patient: &str,
        doctor: &str,
        date: (u32, u32),
        time: &str,
    ) -> Appointment {
        let mut new = new_appointment(patient, doctor);
        new.date = NaiveDate::from_ymd_opt(2024, date.0, date.1).unwrap();
        new.time = time.to_string();
        Appointment::from_new(id.to_string(), Utc::now(), new)
    }

    fn people() -> (Vec<Patient>, Vec<Doctor>) {
        (vec![sample_patient("p1")], vec![sample_doctor("d1")])
    }

    #[test]
    fn test_sort_is_newest_first_by_date_then_time() {
        let mut list = vec![
            appointment("a", "p1", "d1", (6, 10), "09:00"),
            appointment("b", "p1", "d1", (6, 11), "08:00"),
            appointment("c", "p1", "d1", (6, 10), "14:30"),
            appointment("d", "p1", "d1", (6, 10), "9:30"),
        ];

        sort_newest_first(&mut list);

        let ids: Vec<_> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "d", "a"]);
    }

    #[test]
    fn test_appointment_search_covers_names_and_type() {
        let (patients, doctors) = people();
        let known = appointment("a", "p1", "d1", (6, 10), "09:00");
        let mut followup = appointment("b", "gone", "gone", (6, 10), "10:00");
        followup.appointment_type = AppointmentType::Followup;

        let search = |term: &str| AppointmentFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };

        assert!(search("JOHN").matches(&known, &patients, &doctors));
        assert!(search("carter").matches(&known, &patients, &doctors));
        assert!(search("consult").matches(&known, &patients, &doctors));
        assert!(!search("carter").matches(&followup, &patients, &doctors));
        assert!(search("followup").matches(&followup, &patients, &doctors));
        assert!(search("unknown patient").matches(&followup, &patients, &doctors));
        assert!(search("  ").matches(&followup, &patients, &doctors));
    }

    #[test]
    fn test_appointment_filter_combines_status_and_references() {
        let (patients, doctors) = people();
        let mut done = appointment("a", "p1", "d1", (6, 10), "09:00");
        done.status = AppointmentStatus::Completed;
        let open = appointment("b", "p1", "d2", (6, 12), "09:00");
        let other = appointment("c", "p2", "d1", (6, 11), "09:00");

        let filter = AppointmentFilter {
            patient_id: Some("p1".into()),
            ..Default::default()
        };
        let ids: Vec<_> = filter
            .apply(vec![done.clone(), open.clone(), other.clone()], &patients, &doctors)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, ["b", "a"]);

        let filter = AppointmentFilter {
            status: Some(AppointmentStatus::Scheduled),
            doctor_id: Some("d1".into()),
            ..Default::default()
        };
        assert_eq!(
            filter.apply(vec![done, open, other.clone()], &patients, &doctors),
            vec![other]
        );
    }

    #[test]
    fn test_medical_record_search_covers_names_and_notes() {
        let (patients, doctors) = people();
        let mut noted = new_record("p1", "d1");
        noted.notes = "Review inhaler technique".into();
        let noted = MedicalRecord::from_new("r1".into(), Utc::now(), noted);
        let orphan = MedicalRecord::from_new("r2".into(), Utc::now(), new_record("gone", "gone"));

        let search = |term: &str| MedicalRecordFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        let all = || vec![noted.clone(), orphan.clone()];

        assert_eq!(search("inhaler").apply(all(), &patients, &doctors), vec![noted.clone()]);
        assert_eq!(search("dr. emily").apply(all(), &patients, &doctors), vec![noted.clone()]);
        assert_eq!(
            search("unknown doctor").apply(all(), &patients, &doctors),
            vec![orphan.clone()]
        );
        assert_eq!(MedicalRecordFilter::default().apply(all(), &patients, &doctors), all());

        let filter = MedicalRecordFilter {
            patient_id: Some("gone".into()),
            search: Some("doe".into()),
        };
        assert!(filter.apply(all(), &patients, &doctors).is_empty());
    }
}
