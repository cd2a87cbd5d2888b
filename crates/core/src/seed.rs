//! Demonstration data for a fresh installation.

use crate::models::{
    AppointmentPatch, AppointmentStatus, AppointmentType, Gender, NewAppointment, NewDoctor,
    NewPatient, Weekday,
};
use crate::{HospitalStore, StoreResult};
use chrono::{Days, NaiveDate};

/// Inserts four patients, four doctors and four appointments around `today`.
///
/// Does nothing if any patient already exists. Returns whether data was written.
///
/// # Errors
///
/// Returns the first write error the backend surfaces. Records created before the failure are
/// left in place.
pub async fn seed_sample_data(store: &HospitalStore, today: NaiveDate) -> StoreResult<bool> {
    if !store.patients().get_all().await.is_empty() {
        tracing::debug!("sample data skipped, patients already present");
        return Ok(false);
    }

    let mut patients = Vec::new();
    for new in sample_patients() {
        patients.push(store.patients().create(new).await?);
    }
    let mut doctors = Vec::new();
    for new in sample_doctors() {
        doctors.push(store.doctors().create(new).await?);
    }

    let tomorrow = days_after(today, 1);
    let next_week = days_after(today, 7);
    // (patient index, doctor index, date, time, type, notes)
    let bookings = [
        (
            0,
            0,
            tomorrow,
            "10:00",
            AppointmentType::Consultation,
            "Regular checkup for hypertension management",
        ),
        (
            1,
            2,
            next_week,
            "14:30",
            AppointmentType::Consultation,
            "Annual health screening",
        ),
        (
            2,
            1,
            today,
            "09:00",
            AppointmentType::Followup,
            "Diabetes follow-up appointment",
        ),
        (
            3,
            0,
            tomorrow,
            "15:00",
            AppointmentType::Consultation,
            "Asthma medication review",
        ),
    ];

    let mut appointments = Vec::new();
    for (patient, doctor, date, time, appointment_type, notes) in bookings {
        let new = NewAppointment {
            patient_id: patients[patient].id.clone(),
            doctor_id: doctors[doctor].id.clone(),
            date,
            time: time.to_string(),
            appointment_type,
            notes: notes.to_string(),
        };
        appointments.push(store.appointments().create(new).await?);
    }

    // Bookings always start scheduled; today's follow-up has already happened.
    store
        .appointments()
        .update(
            &appointments[2].id,
            AppointmentPatch::status(AppointmentStatus::Completed),
        )
        .await?;

    tracing::info!(
        "++ Seeded {} patients, {} doctors, {} appointments",
        patients.len(),
        doctors.len(),
        appointments.len()
    );
    Ok(true)
}

fn days_after(day: NaiveDate, days: u64) -> NaiveDate {
    day.checked_add_days(Days::new(days)).unwrap_or(day)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[allow(clippy::too_many_arguments)]
fn patient(
    first: &str,
    last: &str,
    phone: &str,
    date_of_birth: NaiveDate,
    gender: Gender,
    address: &str,
    emergency: (&str, &str),
    blood_group: &str,
    allergies: &str,
    history: &str,
) -> NewPatient {
    NewPatient {
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@email.com", first.to_lowercase(), last.to_lowercase()),
        phone: phone.into(),
        date_of_birth,
        gender,
        address: address.into(),
        emergency_contact: emergency.0.into(),
        emergency_phone: emergency.1.into(),
        blood_group: blood_group.into(),
        allergies: allergies.into(),
        medical_history: history.into(),
    }
}

fn sample_patients() -> Vec<NewPatient> {
    vec![
        patient(
            "John",
            "Doe",
            "+1-555-0123",
            date(1985, 3, 15),
            Gender::Male,
            "123 Main St, Anytown, ST 12345",
            ("Jane Doe", "+1-555-0124"),
            "A+",
            "Penicillin",
            "Hypertension, controlled with medication",
        ),
        patient(
            "Sarah",
            "Johnson",
            "+1-555-0125",
            date(1990, 7, 22),
            Gender::Female,
            "456 Oak Ave, Anytown, ST 12345",
            ("Mike Johnson", "+1-555-0126"),
            "B+",
            "None known",
            "No significant medical history",
        ),
        patient(
            "Michael",
            "Chen",
            "+1-555-0127",
            date(1978, 11, 8),
            Gender::Male,
            "789 Pine St, Anytown, ST 12345",
            ("Lisa Chen", "+1-555-0128"),
            "O-",
            "Shellfish",
            "Type 2 Diabetes, well-controlled",
        ),
        patient(
            "Emma",
            "Williams",
            "+1-555-0129",
            date(1995, 5, 14),
            Gender::Female,
            "321 Elm St, Anytown, ST 12345",
            ("Robert Williams", "+1-555-0130"),
            "AB+",
            "Latex",
            "Asthma, uses inhaler as needed",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn doctor(
    first: &str,
    last: &str,
    phone: &str,
    specialization: &str,
    qualification: &str,
    experience: u32,
    consultation_fee: f64,
    availability: &[Weekday],
) -> NewDoctor {
    NewDoctor {
        first_name: first.into(),
        last_name: last.into(),
        email: format!("dr.{}@hospital.com", last.to_lowercase()),
        phone: phone.into(),
        specialization: specialization.into(),
        qualification: qualification.into(),
        experience,
        consultation_fee,
        availability: availability.iter().copied().collect(),
    }
}

fn sample_doctors() -> Vec<NewDoctor> {
    use Weekday::*;

    vec![
        doctor(
            "Emily",
            "Carter",
            "+1-555-0201",
            "General Medicine",
            "MD, MBBS",
            8,
            150.0,
            &[Monday, Tuesday, Wednesday, Thursday, Friday],
        ),
        doctor(
            "David",
            "Rodriguez",
            "+1-555-0202",
            "Cardiology",
            "MD, Cardiology Fellowship",
            12,
            250.0,
            &[Monday, Wednesday, Friday],
        ),
        doctor(
            "Jennifer",
            "Thompson",
            "+1-555-0203",
            "Pediatrics",
            "MD, Pediatrics Residency",
            6,
            180.0,
            &[Tuesday, Thursday, Saturday],
        ),
        doctor(
            "Robert",
            "Anderson",
            "+1-555-0204",
            "Orthopedics",
            "MD, MS Orthopedics",
            15,
            300.0,
            &[Monday, Tuesday, Thursday, Friday],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::models::{doctor_display_name, patient_display_name};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> HospitalStore {
        let cfg = Arc::new(CoreConfig::local(temp_dir.path().to_path_buf()).unwrap());
        HospitalStore::open(cfg).unwrap()
    }

    #[tokio::test]
    async fn test_seed_populates_empty_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(&temp_dir);
        let today = date(2024, 6, 10);

        assert!(seed_sample_data(&store, today).await.unwrap());

        let stats = store.stats(today).await;
        assert_eq!(stats.total_patients, 4);
        assert_eq!(stats.total_doctors, 4);
        assert_eq!(stats.total_appointments, 4);
        assert_eq!(stats.today_appointments, 1);

        let appointments = store.appointments().get_all().await;
        let completed: Vec<_> = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].date, today);
        assert_eq!(completed[0].notes, "Diabetes follow-up appointment");
    }

    #[tokio::test]
    async fn test_seeded_appointments_reference_seeded_people() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(&temp_dir);
        seed_sample_data(&store, date(2024, 6, 10)).await.unwrap();

        let patients = store.patients().get_all().await;
        let doctors = store.doctors().get_all().await;
        let first = &store.appointments().get_all().await[0];

        assert_eq!(patient_display_name(&patients, &first.patient_id), "John Doe");
        assert_eq!(
            doctor_display_name(&doctors, &first.doctor_id),
            "Dr. Emily Carter"
        );
        assert_eq!(first.date, date(2024, 6, 11));
    }

    #[tokio::test]
    async fn test_seed_skips_when_patients_exist() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(&temp_dir);
        let today = date(2024, 6, 10);

        assert!(seed_sample_data(&store, today).await.unwrap());
        assert!(!seed_sample_data(&store, today).await.unwrap());
        assert_eq!(store.patients().get_all().await.len(), 4);
    }
}
