//! Constants used throughout the HMS core crate.
//!
//! Storage key names are part of the on-disk and on-device format: changing one orphans the data
//! already written under the old name.

/// Local storage key for the patient collection.
pub const PATIENTS_KEY: &str = "hms_patients";

/// Local storage key for the doctor collection.
pub const DOCTORS_KEY: &str = "hms_doctors";

/// Local storage key for the appointment collection.
pub const APPOINTMENTS_KEY: &str = "hms_appointments";

/// Local storage key for the medical record collection.
pub const MEDICAL_RECORDS_KEY: &str = "hms_medical_records";

/// Local storage key for the admin credential collection.
pub const ADMIN_AUTH_KEY: &str = "hms_admin_auth";

/// Local storage key for the cached admin session.
pub const ADMIN_SESSION_KEY: &str = "admin_session";

/// Suffix appended to a collection name to form its cached blob id key.
pub const BLOB_ID_KEY_SUFFIX: &str = "_blob_id";

/// Default directory for local storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "hms_data";

/// Default JSON-blob service endpoint.
pub const DEFAULT_BLOB_API_BASE: &str = "https://jsonblob.com/api/jsonBlob";

/// Lifetime of an admin session.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Prefix of minted session tokens.
pub const SESSION_TOKEN_PREFIX: &str = "hms_";

/// Id of the bootstrapped admin credential.
pub const DEFAULT_ADMIN_ID: &str = "admin_1";

/// Username of the bootstrapped admin credential.
pub const DEFAULT_ADMIN_USERNAME: &str = "AdminRith";

/// Password of the bootstrapped admin credential.
pub const DEFAULT_ADMIN_PASSWORD: &str = "5569";
