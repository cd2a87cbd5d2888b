//! The store facade handed to the binaries.

use crate::config::{BackendKind, CoreConfig};
use crate::models::{Appointment, Doctor, MedicalRecord, Patient};
use crate::repositories::{AdminAuthService, Collection};
use crate::search::{AppointmentFilter, MedicalRecordFilter};
use crate::stats::DashboardStats;
use crate::storage::{
    BlobIdRegistry, BootstrapReport, DocumentBackend, JsonBlobClient, KeyValueStore, LocalBackend,
    RemoteBackend,
};
use crate::StoreResult;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// All entity collections and the admin gate over one backend.
///
/// Cheap to clone: every part is reference counted.
#[derive(Clone, Debug)]
pub struct HospitalStore {
    cfg: Arc<CoreConfig>,
    backend: Arc<dyn DocumentBackend>,
    remote: Option<Arc<RemoteBackend>>,
    patients: Collection<Patient>,
    doctors: Collection<Doctor>,
    appointments: Collection<Appointment>,
    medical_records: Collection<MedicalRecord>,
    auth: AdminAuthService,
}

impl HospitalStore {
    /// Opens the store described by `cfg`.
    ///
    /// The data directory is created if missing. For the remote backend, cached blob ids are
    /// loaded from it but no network call is made; call [`bootstrap`](Self::bootstrap) or
    /// [`spawn_bootstrap`](Self::spawn_bootstrap) to allocate missing documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP client cannot be
    /// built.
    pub fn open(cfg: Arc<CoreConfig>) -> StoreResult<Self> {
        let kv = KeyValueStore::open(cfg.data_dir())?;

        match cfg.backend() {
            BackendKind::Local => {
                let backend = Arc::new(LocalBackend::new(kv.clone()));
                Ok(Self::assemble(cfg, kv, backend, None))
            }
            BackendKind::Remote => {
                let client = JsonBlobClient::new(cfg.blob_api_base(), cfg.request_timeout())?;
                let registry = BlobIdRegistry::load(kv.clone());
                let remote = Arc::new(RemoteBackend::new(Arc::new(client), Arc::new(registry)));
                Ok(Self::assemble(cfg, kv, remote.clone(), Some(remote)))
            }
        }
    }

    /// Builds a store over an arbitrary backend. The session is still cached in `kv`.
    pub fn with_backend(
        cfg: Arc<CoreConfig>,
        kv: KeyValueStore,
        backend: Arc<dyn DocumentBackend>,
    ) -> Self {
        Self::assemble(cfg, kv, backend, None)
    }

    fn assemble(
        cfg: Arc<CoreConfig>,
        kv: KeyValueStore,
        backend: Arc<dyn DocumentBackend>,
        remote: Option<Arc<RemoteBackend>>,
    ) -> Self {
        let auth = AdminAuthService::new(Collection::new(backend.clone()), kv, cfg.clone());
        Self {
            patients: Collection::new(backend.clone()),
            doctors: Collection::new(backend.clone()),
            appointments: Collection::new(backend.clone()),
            medical_records: Collection::new(backend.clone()),
            auth,
            cfg,
            backend,
            remote,
        }
    }

    /// Name of the active backend, for logs.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn patients(&self) -> &Collection<Patient> {
        &self.patients
    }

    pub fn doctors(&self) -> &Collection<Doctor> {
        &self.doctors
    }

    pub fn appointments(&self) -> &Collection<Appointment> {
        &self.appointments
    }

    pub fn medical_records(&self) -> &Collection<MedicalRecord> {
        &self.medical_records
    }

    pub fn auth(&self) -> &AdminAuthService {
        &self.auth
    }

    /// Allocates remote documents for collections without one. `None` for a local store.
    pub async fn bootstrap(&self) -> Option<BootstrapReport> {
        match &self.remote {
            Some(remote) => Some(remote.bootstrap().await),
            None => None,
        }
    }

    /// Starts [`bootstrap`](Self::bootstrap) in the background. `None` for a local store.
    pub fn spawn_bootstrap(&self) -> Option<JoinHandle<BootstrapReport>> {
        self.remote.as_ref().map(|remote| remote.spawn_bootstrap())
    }

    pub async fn stats(&self, today: NaiveDate) -> DashboardStats {
        DashboardStats::collect(self, today).await
    }

    /// Appointments matching `filter`, newest first.
    pub async fn find_appointments(&self, filter: &AppointmentFilter) -> Vec<Appointment> {
        let (appointments, patients, doctors) = tokio::join!(
            self.appointments.get_all(),
            self.patients.get_all(),
            self.doctors.get_all()
        );
        filter.apply(appointments, &patients, &doctors)
    }

    /// Medical records matching `filter`, in stored order.
    pub async fn find_medical_records(&self, filter: &MedicalRecordFilter) -> Vec<MedicalRecord> {
        let (records, patients, doctors) = tokio::join!(
            self.medical_records.get_all(),
            self.patients.get_all(),
            self.doctors.get_all()
        );
        filter.apply(records, &patients, &doctors)
    }
}
