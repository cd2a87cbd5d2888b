//! # HMS Core
//!
//! Persistence and synchronisation layer for the hospital administration back office.
//!
//! This crate contains pure data operations:
//! - Patient, doctor, appointment and medical record collections
//! - A local key/value backend and a remote JSON-blob backend behind one contract
//! - The admin login gate and cached session
//! - Listing filters, sample data and dashboard totals
//!
//! **No API concerns**: HTTP serving and argument parsing belong in `hms-run` and `hms-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod repositories;
pub mod search;
pub mod seed;
pub mod stats;
pub mod storage;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::{backend_kind_from_env_value, BackendKind, CoreConfig};
pub use error::{StoreError, StoreResult};
pub use hms_types::NonEmptyText;
pub use repositories::{AdminAuthService, Collection};
pub use search::{AppointmentFilter, MedicalRecordFilter};
pub use seed::seed_sample_data;
pub use stats::DashboardStats;
pub use storage::{BootstrapReport, CollectionKind, DocumentBackend};
pub use store::HospitalStore;
