use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hms_core::constants::{DEFAULT_BLOB_API_BASE, DEFAULT_DATA_DIR};
use hms_core::models::{
    Appointment, AppointmentPatch, AppointmentStatus, Doctor, DoctorPatch, MedicalRecord,
    NewAppointment, NewDoctor, NewMedicalRecord, NewPatient, Patient, PatientPatch,
};
use hms_core::{
    AppointmentFilter, CoreConfig, DashboardStats, HospitalStore, MedicalRecordFilter, StoreError,
    backend_kind_from_env_value,
};

type ApiError = (StatusCode, String);

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    store: HospitalStore,
}

#[derive(Serialize)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Deserialize)]
struct LoginReq {
    username: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRes {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRes {
    valid: bool,
    username: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentQuery {
    patient_id: Option<String>,
    doctor_id: Option<String>,
    status: Option<AppointmentStatus>,
    search: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordQuery {
    patient_id: Option<String>,
    search: Option<String>,
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

/// Main entry point for the HMS REST server
///
/// Opens the store, starts the remote document bootstrap in the background (remote backend
/// only) and serves the REST API.
///
/// # Environment Variables
/// - `HMS_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - see [`config_from_env`] for the store settings
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hms_run=info".parse()?)
                .add_directive("hms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("HMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(config_from_env()?);
    tracing::info!(
        "-- Data directory: {} ({} backend)",
        cfg.data_dir().display(),
        cfg.backend()
    );

    let store = HospitalStore::open(cfg)?;
    if store.spawn_bootstrap().is_some() {
        tracing::info!("++ Blob document bootstrap started");
    }

    let app = app(AppState { store });

    tracing::info!("++ Starting HMS REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/stats", get(stats))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).patch(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/appointments", get(patient_appointments))
        .route("/patients/:id/records", get(patient_records))
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/doctors/:id",
            get(get_doctor).patch(update_doctor).delete(delete_doctor),
        )
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/:id",
            get(get_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
        .route("/records", get(list_records).post(create_record))
        .route("/records/:id", get(get_record).delete(delete_record))
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/session", get(session))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Rejects requests without the bearer token of the current valid session.
async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if state.store.auth().session_token_matches(token) => next.run(request).await,
        _ => (StatusCode::FORBIDDEN, "Login required").into_response(),
    }
}

fn store_error(e: StoreError) -> ApiError {
    let status = match &e {
        StoreError::InvalidInput(_) | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        StoreError::Http(_)
        | StoreError::RemoteStatus { .. }
        | StoreError::MissingLocation
        | StoreError::MissingDocumentId(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Store error: {}", e);
    }
    (status, e.to_string())
}

fn not_found(what: &str, id: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("No {what} with id {id}"))
}

fn deleted(found: bool, what: &str, id: &str) -> Result<StatusCode, ApiError> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(what, id))
    }
}

// ============================================================================
// HEALTH, STATS AND SESSION
// ============================================================================

#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "HMS REST API is alive".into(),
    })
}

/// Dashboard totals, counting appointments dated today (UTC).
#[axum::debug_handler]
async fn stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.store.stats(Utc::now().date_naive()).await)
}

/// Log in and receive the session token
///
/// # Errors
/// Returns `401 Unauthorized` if the credentials do not match. Any session from an earlier
/// login stays valid.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginRes>, ApiError> {
    let auth = state.store.auth();
    match auth
        .login(&req.username, &req.password)
        .await
        .map_err(store_error)?
    {
        Some(token) => Ok(Json(LoginRes {
            token,
            expires_at: auth.current_session().map(|s| s.expires_at),
        })),
        None => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".into(),
        )),
    }
}

/// End the current session. Requires its bearer token.
async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.auth().logout().map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn session(State(state): State<AppState>) -> Json<SessionRes> {
    let current = state.store.auth().current_session();
    Json(SessionRes {
        valid: current.is_some(),
        username: current.as_ref().map(|s| s.username.clone()),
        expires_at: current.map(|s| s.expires_at),
    })
}

// ============================================================================
// PATIENTS
// ============================================================================

/// List patients, optionally filtered by `?search=` on name, email or phone
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Patient>> {
    let term = query.search.unwrap_or_default();
    Json(
        state
            .store
            .patients()
            .filter(|p| p.matches_search(&term))
            .await,
    )
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    state
        .store
        .patients()
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("patient", &id))
}

#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let patient = state
        .store
        .patients()
        .create(req)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PatientPatch>,
) -> Result<Json<Patient>, ApiError> {
    state
        .store
        .patients()
        .update(&id, patch)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("patient", &id))
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let found = state
        .store
        .patients()
        .delete(&id)
        .await
        .map_err(store_error)?;
    deleted(found, "patient", &id)
}

async fn patient_appointments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<Appointment>> {
    Json(state.store.appointments().get_by_patient_id(&id).await)
}

async fn patient_records(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<MedicalRecord>> {
    Json(state.store.medical_records().get_by_patient_id(&id).await)
}

// ============================================================================
// DOCTORS
// ============================================================================

/// List doctors, optionally filtered by `?search=` on name, email, phone or specialization
#[axum::debug_handler]
async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Doctor>> {
    let term = query.search.unwrap_or_default();
    Json(
        state
            .store
            .doctors()
            .filter(|d| d.matches_search(&term))
            .await,
    )
}

async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    state
        .store
        .doctors()
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("doctor", &id))
}

async fn create_doctor(
    State(state): State<AppState>,
    Json(req): Json<NewDoctor>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    let doctor = state
        .store
        .doctors()
        .create(req)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

async fn update_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<DoctorPatch>,
) -> Result<Json<Doctor>, ApiError> {
    state
        .store
        .doctors()
        .update(&id, patch)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("doctor", &id))
}

async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let found = state
        .store
        .doctors()
        .delete(&id)
        .await
        .map_err(store_error)?;
    deleted(found, "doctor", &id)
}

// ============================================================================
// APPOINTMENTS
// ============================================================================

/// List appointments, newest first
///
/// Optional filters: `?patientId=`, `?doctorId=`, `?status=` and `?search=` on patient name,
/// doctor name or type.
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentQuery>,
) -> Json<Vec<Appointment>> {
    let filter = AppointmentFilter {
        patient_id: query.patient_id,
        doctor_id: query.doctor_id,
        status: query.status,
        search: query.search,
    };
    Json(state.store.find_appointments(&filter).await)
}

async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    state
        .store
        .appointments()
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("appointment", &id))
}

async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let appointment = state
        .store
        .appointments()
        .create(req)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Patch an appointment
///
/// # Errors
/// Returns `409 Conflict` when the patch moves a completed or cancelled appointment to another
/// status.
#[axum::debug_handler]
async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<Json<Appointment>, ApiError> {
    state
        .store
        .appointments()
        .update(&id, patch)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("appointment", &id))
}

async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let found = state
        .store
        .appointments()
        .delete(&id)
        .await
        .map_err(store_error)?;
    deleted(found, "appointment", &id)
}

// ============================================================================
// MEDICAL RECORDS
// ============================================================================

/// List medical records, optionally filtered by `?patientId=` and `?search=` on patient name,
/// doctor name or notes
async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Json<Vec<MedicalRecord>> {
    let filter = MedicalRecordFilter {
        patient_id: query.patient_id,
        search: query.search,
    };
    Json(state.store.find_medical_records(&filter).await)
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MedicalRecord>, ApiError> {
    state
        .store
        .medical_records()
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("medical record", &id))
}

async fn create_record(
    State(state): State<AppState>,
    Json(req): Json<NewMedicalRecord>,
) -> Result<(StatusCode, Json<MedicalRecord>), ApiError> {
    let record = state
        .store
        .medical_records()
        .create(req)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let found = state
        .store
        .medical_records()
        .delete(&id)
        .await
        .map_err(store_error)?;
    deleted(found, "medical record", &id)
}
