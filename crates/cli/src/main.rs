use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use hms_core::constants::{DEFAULT_BLOB_API_BASE, DEFAULT_DATA_DIR};
use hms_core::models::{
    doctor_display_name, patient_display_name, AppointmentPatch, AppointmentStatus,
    AppointmentType, Gender, NewAppointment, NewDoctor, NewMedicalRecord, NewPatient, Vitals,
    Weekday,
};
use hms_core::{
    backend_kind_from_env_value, seed_sample_data, AppointmentFilter, CoreConfig, HospitalStore,
    MedicalRecordFilter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "Hospital management back office CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as an admin
    Login {
        username: String,
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the current session
    Session,
    /// Insert sample patients, doctors and appointments into an empty store
    Seed,
    /// Show dashboard totals
    Stats,
    /// Create remote documents for collections that have none
    Bootstrap,
    /// Manage patients
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Manage doctors
    #[command(subcommand)]
    Doctors(DoctorCommands),
    /// Manage appointments
    #[command(subcommand)]
    Appointments(AppointmentCommands),
    /// Manage medical records
    #[command(subcommand)]
    Records(RecordCommands),
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List patients
    List {
        /// Filter by name, email or phone
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one patient with their appointments and records
    Show { id: String },
    /// Register a patient
    Add(AddPatient),
    /// Delete a patient
    Remove { id: String },
}

#[derive(Args)]
struct AddPatient {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    dob: NaiveDate,
    /// male, female or other
    #[arg(long)]
    gender: Gender,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    emergency_contact: String,
    #[arg(long, default_value = "")]
    emergency_phone: String,
    #[arg(long, default_value = "")]
    blood_group: String,
    #[arg(long, default_value = "")]
    allergies: String,
    #[arg(long, default_value = "")]
    medical_history: String,
}

#[derive(Subcommand)]
enum DoctorCommands {
    /// List doctors
    List {
        /// Filter by name, email, phone or specialization
        #[arg(long)]
        search: Option<String>,
    },
    /// Register a doctor
    Add(AddDoctor),
    /// Delete a doctor
    Remove { id: String },
}

#[derive(Args)]
struct AddDoctor {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    specialization: String,
    #[arg(long)]
    qualification: String,
    /// Years of experience
    #[arg(long, default_value_t = 0)]
    experience: u32,
    #[arg(long, default_value_t = 0.0)]
    fee: f64,
    /// Working days (comma-separated, e.g. Mon,Wed,Fri)
    #[arg(long, value_delimiter = ',')]
    days: Vec<Weekday>,
}

#[derive(Subcommand)]
enum AppointmentCommands {
    /// List appointments, newest first
    List {
        #[arg(long)]
        patient: Option<String>,
        #[arg(long)]
        doctor: Option<String>,
        /// scheduled, completed or cancelled
        #[arg(long)]
        status: Option<AppointmentStatus>,
        /// Match patient name, doctor name or type
        #[arg(long)]
        search: Option<String>,
    },
    /// Book an appointment
    Book {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        doctor: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Time slot, e.g. 10:00
        #[arg(long)]
        time: String,
        /// consultation, followup or emergency
        #[arg(long = "type", default_value = "consultation")]
        kind: AppointmentType,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Mark an appointment completed
    Complete { id: String },
    /// Cancel an appointment
    Cancel { id: String },
    /// Delete an appointment
    Remove { id: String },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// List medical records
    List {
        #[arg(long)]
        patient: Option<String>,
        /// Match patient name, doctor name or notes
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a medical record
    Add(AddRecord),
    /// Delete a medical record
    Remove { id: String },
}

#[derive(Args)]
struct AddRecord {
    #[arg(long)]
    patient: String,
    #[arg(long)]
    doctor: String,
    #[arg(long)]
    diagnosis: String,
    /// Appointment the record belongs to
    #[arg(long, default_value = "")]
    appointment: String,
    #[arg(long, default_value = "")]
    prescription: String,
    #[arg(long, default_value = "")]
    notes: String,
    #[arg(long, default_value = "")]
    blood_pressure: String,
    #[arg(long, default_value = "")]
    heart_rate: String,
    #[arg(long, default_value = "")]
    temperature: String,
    #[arg(long, default_value = "")]
    weight: String,
    #[arg(long, default_value = "")]
    height: String,
}

/// Builds the store configuration from the environment.
///
/// # Environment Variables
/// - `HMS_DATA_DIR`: local storage directory (default: "hms_data")
/// - `HMS_BACKEND`: `local` or `remote` (default: "local")
/// - `HMS_BLOB_API_BASE`: JSON-blob endpoint for the remote backend
fn config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = std::env::var("HMS_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let backend = backend_kind_from_env_value(std::env::var("HMS_BACKEND").ok())?;
    let blob_api_base =
        std::env::var("HMS_BLOB_API_BASE").unwrap_or_else(|_| DEFAULT_BLOB_API_BASE.into());

    Ok(CoreConfig::new(
        PathBuf::from(data_dir),
        backend,
        blob_api_base,
    )?)
}

fn require_session(store: &HospitalStore) -> anyhow::Result<()> {
    if !store.auth().validate_session() {
        bail!("not logged in or session expired; run `hms login <username> <password>`");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hms_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'hms --help' for commands");
        return Ok(());
    };

    let store = HospitalStore::open(Arc::new(config_from_env()?))?;

    // A one-shot process cannot leave the bootstrap running in the background.
    if !matches!(command, Commands::Bootstrap) {
        if let Some(report) = store.bootstrap().await {
            if !report.is_complete() {
                tracing::warn!("no remote document for: {:?}", report.failed);
            }
        }
    }

    match command {
        Commands::Login { username, password } => {
            match store.auth().login(&username, &password).await? {
                Some(_) => {
                    let session = store
                        .auth()
                        .current_session()
                        .context("session was not stored")?;
                    println!(
                        "Logged in as {} until {}",
                        session.username, session.expires_at
                    );
                }
                None => bail!("invalid username or password"),
            }
        }
        Commands::Logout => {
            store.auth().logout()?;
            println!("Logged out.");
        }
        Commands::Session => match store.auth().current_session() {
            Some(session) => println!(
                "Logged in as {} (session {} expires {})",
                session.username, session.id, session.expires_at
            ),
            None => println!("No active session."),
        },
        Commands::Bootstrap => match store.bootstrap().await {
            Some(report) => {
                println!(
                    "Created {} document(s), {} failed.",
                    report.created.len(),
                    report.failed.len()
                );
                if !report.is_complete() {
                    bail!("bootstrap incomplete; rerun once the blob service is reachable");
                }
            }
            None => println!("Local backend: nothing to bootstrap."),
        },
        Commands::Seed => {
            require_session(&store)?;
            if seed_sample_data(&store, Utc::now().date_naive()).await? {
                println!("Sample data created.");
            } else {
                println!("Patients already exist; sample data skipped.");
            }
        }
        Commands::Stats => {
            require_session(&store)?;
            let stats = store.stats(Utc::now().date_naive()).await;
            println!("Total patients:       {}", stats.total_patients);
            println!("Total doctors:        {}", stats.total_doctors);
            println!("Total appointments:   {}", stats.total_appointments);
            println!("Today's appointments: {}", stats.today_appointments);
        }
        Commands::Patients(cmd) => {
            require_session(&store)?;
            run_patients(&store, cmd).await?
        }
        Commands::Doctors(cmd) => {
            require_session(&store)?;
            run_doctors(&store, cmd).await?
        }
        Commands::Appointments(cmd) => {
            require_session(&store)?;
            run_appointments(&store, cmd).await?
        }
        Commands::Records(cmd) => {
            require_session(&store)?;
            run_records(&store, cmd).await?
        }
    }

    Ok(())
}

async fn run_patients(store: &HospitalStore, cmd: PatientCommands) -> anyhow::Result<()> {
    match cmd {
        PatientCommands::List { search } => {
            let term = search.unwrap_or_default();
            let patients = store
                .patients()
                .filter(|p| p.matches_search(&term))
                .await;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for p in patients {
                println!(
                    "ID: {}, Name: {}, Email: {}, Phone: {}, DOB: {}",
                    p.id,
                    p.full_name(),
                    p.email,
                    p.phone,
                    p.date_of_birth
                );
            }
        }
        PatientCommands::Show { id } => {
            let patient = store
                .patients()
                .get_by_id(&id)
                .await
                .with_context(|| format!("no patient with id {id}"))?;
            println!("{} ({}, born {})", patient.full_name(), patient.gender, patient.date_of_birth);
            println!("  Email: {}  Phone: {}", patient.email, patient.phone);
            println!("  Blood group: {}  Allergies: {}", patient.blood_group, patient.allergies);

            let doctors = store.doctors().get_all().await;
            println!("Appointments:");
            for a in store.appointments().get_by_patient_id(&id).await {
                println!(
                    "  {} {} {} with {} [{}]",
                    a.date,
                    a.time,
                    a.appointment_type,
                    doctor_display_name(&doctors, &a.doctor_id),
                    a.status
                );
            }
            println!("Medical records:");
            for r in store.medical_records().get_by_patient_id(&id).await {
                println!(
                    "  {} {} by {}",
                    r.created_at.date_naive(),
                    r.diagnosis,
                    doctor_display_name(&doctors, &r.doctor_id)
                );
            }
        }
        PatientCommands::Add(args) => {
            let patient = store
                .patients()
                .create(NewPatient {
                    first_name: args.first_name,
                    last_name: args.last_name,
                    email: args.email,
                    phone: args.phone,
                    date_of_birth: args.dob,
                    gender: args.gender,
                    address: args.address,
                    emergency_contact: args.emergency_contact,
                    emergency_phone: args.emergency_phone,
                    blood_group: args.blood_group,
                    allergies: args.allergies,
                    medical_history: args.medical_history,
                })
                .await?;
            println!("Created patient with ID: {}", patient.id);
        }
        PatientCommands::Remove { id } => report_delete(store.patients().delete(&id).await?, &id),
    }
    Ok(())
}

async fn run_doctors(store: &HospitalStore, cmd: DoctorCommands) -> anyhow::Result<()> {
    match cmd {
        DoctorCommands::List { search } => {
            let term = search.unwrap_or_default();
            let doctors = store.doctors().filter(|d| d.matches_search(&term)).await;
            if doctors.is_empty() {
                println!("No doctors found.");
            }
            for d in doctors {
                let days: Vec<String> = d.availability.iter().map(ToString::to_string).collect();
                println!(
                    "ID: {}, Name: Dr. {}, Specialization: {}, Fee: {:.2}, Days: {}",
                    d.id,
                    d.full_name(),
                    d.specialization,
                    d.consultation_fee,
                    days.join(", ")
                );
            }
        }
        DoctorCommands::Add(args) => {
            let doctor = store
                .doctors()
                .create(NewDoctor {
                    first_name: args.first_name,
                    last_name: args.last_name,
                    email: args.email,
                    phone: args.phone,
                    specialization: args.specialization,
                    qualification: args.qualification,
                    experience: args.experience,
                    consultation_fee: args.fee,
                    availability: args.days.into_iter().collect(),
                })
                .await?;
            println!("Created doctor with ID: {}", doctor.id);
        }
        DoctorCommands::Remove { id } => report_delete(store.doctors().delete(&id).await?, &id),
    }
    Ok(())
}

async fn run_appointments(store: &HospitalStore, cmd: AppointmentCommands) -> anyhow::Result<()> {
    match cmd {
        AppointmentCommands::List {
            patient,
            doctor,
            status,
            search,
        } => {
            let filter = AppointmentFilter {
                patient_id: patient,
                doctor_id: doctor,
                status,
                search,
            };
            let appointments = store.find_appointments(&filter).await;
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            let (patients, doctors) =
                tokio::join!(store.patients().get_all(), store.doctors().get_all());
            for a in appointments {
                println!(
                    "ID: {}, {} {}, {} with {}, {} [{}]",
                    a.id,
                    a.date,
                    a.time,
                    patient_display_name(&patients, &a.patient_id),
                    doctor_display_name(&doctors, &a.doctor_id),
                    a.appointment_type,
                    a.status
                );
            }
        }
        AppointmentCommands::Book {
            patient,
            doctor,
            date,
            time,
            kind,
            notes,
        } => {
            let appointment = store
                .appointments()
                .create(NewAppointment {
                    patient_id: patient,
                    doctor_id: doctor,
                    date,
                    time,
                    appointment_type: kind,
                    notes,
                })
                .await?;
            println!("Booked appointment with ID: {}", appointment.id);
        }
        AppointmentCommands::Complete { id } => {
            set_status(store, &id, AppointmentStatus::Completed).await?
        }
        AppointmentCommands::Cancel { id } => {
            set_status(store, &id, AppointmentStatus::Cancelled).await?
        }
        AppointmentCommands::Remove { id } => {
            report_delete(store.appointments().delete(&id).await?, &id)
        }
    }
    Ok(())
}

async fn set_status(
    store: &HospitalStore,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<()> {
    match store
        .appointments()
        .update(id, AppointmentPatch::status(status))
        .await?
    {
        Some(appointment) => println!("Appointment {} is now {}", appointment.id, appointment.status),
        None => bail!("no appointment with id {id}"),
    }
    Ok(())
}

async fn run_records(store: &HospitalStore, cmd: RecordCommands) -> anyhow::Result<()> {
    match cmd {
        RecordCommands::List { patient, search } => {
            let filter = MedicalRecordFilter {
                patient_id: patient,
                search,
            };
            let records = store.find_medical_records(&filter).await;
            if records.is_empty() {
                println!("No medical records found.");
            }
            let (patients, doctors) =
                tokio::join!(store.patients().get_all(), store.doctors().get_all());
            for r in records {
                println!(
                    "ID: {}, {}: {}, {} by {}",
                    r.id,
                    r.created_at.date_naive(),
                    patient_display_name(&patients, &r.patient_id),
                    r.diagnosis,
                    doctor_display_name(&doctors, &r.doctor_id),
                );
            }
        }
        RecordCommands::Add(args) => {
            let record = store
                .medical_records()
                .create(NewMedicalRecord {
                    patient_id: args.patient,
                    doctor_id: args.doctor,
                    appointment_id: args.appointment,
                    diagnosis: args.diagnosis,
                    prescription: args.prescription,
                    notes: args.notes,
                    vitals: Vitals {
                        blood_pressure: args.blood_pressure,
                        heart_rate: args.heart_rate,
                        temperature: args.temperature,
                        weight: args.weight,
                        height: args.height,
                    },
                })
                .await?;
            println!("Created medical record with ID: {}", record.id);
        }
        RecordCommands::Remove { id } => {
            report_delete(store.medical_records().delete(&id).await?, &id)
        }
    }
    Ok(())
}

fn report_delete(deleted: bool, id: &str) {
    if deleted {
        println!("Deleted {id}");
    } else {
        println!("Nothing to delete: no record with id {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_booking() {
        let cli = Cli::try_parse_from([
            "hms", "appointments", "book", "--patient", "p1", "--doctor", "d1", "--date",
            "2024-06-10", "--time", "10:00", "--type", "followup",
        ])
        .unwrap();

        let Some(Commands::Appointments(AppointmentCommands::Book { date, kind, .. })) =
            cli.command
        else {
            panic!("expected appointments book");
        };
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(kind, AppointmentType::Followup);
    }

    #[test]
    fn test_parses_doctor_days() {
        let cli = Cli::try_parse_from([
            "hms", "doctors", "add", "--first-name", "Emily", "--last-name", "Carter",
            "--email", "e@h.com", "--phone", "1", "--specialization", "GP",
            "--qualification", "MD", "--days", "Mon,Wed,Friday",
        ])
        .unwrap();

        let Some(Commands::Doctors(DoctorCommands::Add(args))) = cli.command else {
            panic!("expected doctors add");
        };
        assert_eq!(
            args.days,
            vec![Weekday::Monday, Weekday::Wednesday, Weekday::Friday]
        );
    }

    #[test]
    fn test_rejects_unknown_gender() {
        let result = Cli::try_parse_from([
            "hms", "patients", "add", "--first-name", "A", "--last-name", "B", "--email", "e",
            "--phone", "1", "--dob", "1990-01-01", "--gender", "robot",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parses_appointment_filters() {
        let cli = Cli::try_parse_from([
            "hms", "appointments", "list", "--patient", "p1", "--doctor", "d1", "--status",
            "Completed", "--search", "carter",
        ])
        .unwrap();

        let Some(Commands::Appointments(AppointmentCommands::List {
            patient,
            doctor,
            status,
            search,
        })) = cli.command
        else {
            panic!("expected appointments list");
        };
        assert_eq!(patient.as_deref(), Some("p1"));
        assert_eq!(doctor.as_deref(), Some("d1"));
        assert_eq!(status, Some(AppointmentStatus::Completed));
        assert_eq!(search.as_deref(), Some("carter"));

        assert!(Cli::try_parse_from(["hms", "appointments", "list", "--status", "soon"]).is_err());
    }
}
