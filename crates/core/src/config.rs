//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the store layer. Nothing in `hms-core` reads environment variables or keeps
//! process-wide state: the binaries build a [`CoreConfig`] and hand it down as an
//! `Arc<CoreConfig>`.

use crate::constants::{
    DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, DEFAULT_BLOB_API_BASE, SESSION_TTL_HOURS,
};
use crate::{StoreError, StoreResult};
use chrono::Duration;
use hms_types::NonEmptyText;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which backing resource the collections persist to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One file per collection under the data directory.
    #[default]
    Local,
    /// One JSON-blob document per collection; ids cached under the data directory.
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" | "jsonblob" => Ok(BackendKind::Remote),
            other => Err(StoreError::InvalidInput(format!(
                "unknown backend '{other}' (expected 'local' or 'remote')"
            ))),
        }
    }
}

/// Credentials written to an empty admin collection on first login.
#[derive(Clone, Debug)]
pub struct AdminDefaults {
    pub username: NonEmptyText,
    pub password: NonEmptyText,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    backend: BackendKind,
    blob_api_base: String,
    request_timeout: Option<std::time::Duration>,
    session_ttl: Duration,
    default_admin: AdminDefaults,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `blob_api_base` is only contacted when `backend` is [`BackendKind::Remote`], but it is
    /// validated regardless so a misconfigured deployment fails at startup.
    pub fn new(
        data_dir: PathBuf,
        backend: BackendKind,
        blob_api_base: impl Into<String>,
    ) -> StoreResult<Self> {
        let blob_api_base = blob_api_base.into().trim().trim_end_matches('/').to_string();
        if !(blob_api_base.starts_with("http://") || blob_api_base.starts_with("https://")) {
            return Err(StoreError::InvalidInput(format!(
                "blob API base must be an http(s) URL, got '{blob_api_base}'"
            )));
        }

        Ok(Self {
            data_dir,
            backend,
            blob_api_base,
            request_timeout: None,
            session_ttl: Duration::hours(SESSION_TTL_HOURS),
            default_admin: AdminDefaults {
                username: NonEmptyText::new(DEFAULT_ADMIN_USERNAME)?,
                password: NonEmptyText::new(DEFAULT_ADMIN_PASSWORD)?,
            },
        })
    }

    /// Configuration for a local-only store rooted at `data_dir`.
    pub fn local(data_dir: PathBuf) -> StoreResult<Self> {
        Self::new(data_dir, BackendKind::Local, DEFAULT_BLOB_API_BASE)
    }

    /// Applies a per-request timeout to blob service calls. Without one, a hung request waits
    /// indefinitely.
    pub fn with_request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_default_admin(mut self, username: NonEmptyText, password: NonEmptyText) -> Self {
        self.default_admin = AdminDefaults { username, password };
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn blob_api_base(&self) -> &str {
        &self.blob_api_base
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.request_timeout
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn default_admin(&self) -> &AdminDefaults {
        &self.default_admin
    }
}

/// Parse the backend kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`BackendKind::Local`].
pub fn backend_kind_from_env_value(value: Option<String>) -> StoreResult<BackendKind> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<BackendKind>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_defaults_to_local() {
        assert_eq!(backend_kind_from_env_value(None).unwrap(), BackendKind::Local);
        assert_eq!(
            backend_kind_from_env_value(Some("   ".into())).unwrap(),
            BackendKind::Local
        );
    }

    #[test]
    fn test_backend_kind_parses_remote_case_insensitively() {
        assert_eq!(
            backend_kind_from_env_value(Some("Remote".into())).unwrap(),
            BackendKind::Remote
        );
        assert_eq!(
            backend_kind_from_env_value(Some("jsonblob".into())).unwrap(),
            BackendKind::Remote
        );
    }

    #[test]
    fn test_backend_kind_rejects_unknown() {
        let err = backend_kind_from_env_value(Some("sqlite".into())).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn test_new_rejects_non_http_base() {
        let err = CoreConfig::new(PathBuf::from("data"), BackendKind::Remote, "ftp://example")
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn test_new_trims_trailing_slash_and_sets_defaults() {
        let cfg = CoreConfig::new(
            PathBuf::from("data"),
            BackendKind::Remote,
            "https://jsonblob.com/api/jsonBlob/",
        )
        .unwrap();

        assert_eq!(cfg.blob_api_base(), "https://jsonblob.com/api/jsonBlob");
        assert_eq!(cfg.session_ttl(), Duration::hours(24));
        assert_eq!(cfg.request_timeout(), None);
        assert_eq!(cfg.default_admin().username.as_str(), "AdminRith");
        assert_eq!(cfg.default_admin().password.as_str(), "5569");
    }
}
