//! Dashboard totals.

use crate::models::Appointment;
use crate::HospitalStore;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub total_doctors: usize,
    pub total_appointments: usize,
    /// Appointments dated `today`, whatever their status.
    pub today_appointments: usize,
}

impl DashboardStats {
    /// Loads the patient, doctor and appointment collections concurrently and counts them.
    pub async fn collect(store: &HospitalStore, today: NaiveDate) -> Self {
        let (patients, doctors, appointments) = tokio::join!(
            store.patients().get_all(),
            store.doctors().get_all(),
            store.appointments().get_all(),
        );

        Self {
            total_patients: patients.len(),
            total_doctors: doctors.len(),
            total_appointments: appointments.len(),
            today_appointments: count_on(&appointments, today),
        }
    }
}

fn count_on(appointments: &[Appointment], day: NaiveDate) -> usize {
    appointments.iter().filter(|a| a.date == day).count()
}
