//! Admin login gate and session lifecycle.
//!
//! Credentials live in the `admin_auth` collection on the configured backend. The session is
//! always cached in local storage under `admin_session`, so a device stays logged in regardless
//! of where the collections are kept.
//!
//! This is a shared-credential gate for a back-office UI, not an identity system: passwords are
//! stored as entered and there are no roles.

use super::Collection;
use crate::config::CoreConfig;
use crate::constants::{ADMIN_SESSION_KEY, DEFAULT_ADMIN_ID, SESSION_TOKEN_PREFIX};
use crate::models::{AdminCredential, AdminSession};
use crate::storage::KeyValueStore;
use crate::{StoreError, StoreResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

#[derive(Clone, Debug)]
pub struct AdminAuthService {
    credentials: Collection<AdminCredential>,
    kv: KeyValueStore,
    cfg: Arc<CoreConfig>,
}

impl AdminAuthService {
    pub fn new(
        credentials: Collection<AdminCredential>,
        kv: KeyValueStore,
        cfg: Arc<CoreConfig>,
    ) -> Self {
        Self {
            credentials,
            kv,
            cfg,
        }
    }

    /// Returns the stored credentials, writing the configured default admin first if there are
    /// none.
    ///
    /// A failed write of the default admin is logged and the default is still returned, so the
    /// gate stays usable while the backend is unreachable.
    pub async fn ensure_default_admin(&self) -> Vec<AdminCredential> {
        let existing = self.credentials.get_all().await;
        if !existing.is_empty() {
            return existing;
        }

        let defaults = self.cfg.default_admin();
        let admin = AdminCredential {
            id: DEFAULT_ADMIN_ID.to_string(),
            username: defaults.username.as_str().to_string(),
            password: defaults.password.as_str().to_string(),
            created_at: Utc::now(),
        };
        let seeded = vec![admin];
        match self.credentials.replace_all(&seeded).await {
            Ok(()) => tracing::info!("++ Created default admin credential"),
            Err(e) => tracing::warn!("failed to store default admin credential: {}", e),
        }
        seeded
    }

    /// Checks `username` and `password` against the stored credentials.
    ///
    /// On a match a new session is cached, replacing any previous one, and its token is
    /// returned. On a mismatch `Ok(None)` is returned and the cached session is left as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the new session cannot be written to local storage.
    pub async fn login(&self, username: &str, password: &str) -> StoreResult<Option<String>> {
        let credentials = self.ensure_default_admin().await;
        let Some(credential) = credentials
            .iter()
            .find(|c| credentials_match(c, username, password))
        else {
            tracing::info!("admin login rejected for '{}'", username);
            return Ok(None);
        };

        let now = Utc::now();
        let session = AdminSession {
            id: credential.id.clone(),
            username: credential.username.clone(),
            token: mint_token(),
            expires_at: now + self.cfg.session_ttl(),
            created_at: now,
        };
        let raw = serde_json::to_string(&session).map_err(StoreError::Serialization)?;
        self.kv.set_item(ADMIN_SESSION_KEY, &raw)?;

        tracing::info!(
            "admin '{}' logged in, session expires {}",
            session.username,
            session.expires_at
        );
        Ok(Some(session.token))
    }

    /// True iff a cached session exists and has not expired.
    pub fn validate_session(&self) -> bool {
        self.validate_session_at(Utc::now())
    }

    pub fn validate_session_at(&self, now: DateTime<Utc>) -> bool {
        self.current_session_at(now).is_some()
    }

    /// The cached session, if it is still valid.
    pub fn current_session(&self) -> Option<AdminSession> {
        self.current_session_at(Utc::now())
    }

    fn current_session_at(&self, now: DateTime<Utc>) -> Option<AdminSession> {
        let raw = match self.kv.get_item(ADMIN_SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("failed to read admin session: {}", e);
                return None;
            }
        };
        let session: AdminSession = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("ignoring unparseable admin session: {}", e);
                return None;
            }
        };
        session.is_valid_at(now).then_some(session)
    }

    /// Whether `token` is the token of the current valid session.
    pub fn session_token_matches(&self, token: &str) -> bool {
        self.current_session()
            .is_some_and(|s| bool::from(s.token.as_bytes().ct_eq(token.as_bytes())))
    }

    /// Drops the cached session. Logging out twice is not an error.
    pub fn logout(&self) -> StoreResult<()> {
        self.kv.remove_item(ADMIN_SESSION_KEY)?;
        tracing::info!("admin logged out");
        Ok(())
    }
}

fn credentials_match(credential: &AdminCredential, username: &str, password: &str) -> bool {
    let user_ok = credential.username.as_bytes().ct_eq(username.as_bytes());
    let pass_ok = credential.password.as_bytes().ct_eq(password.as_bytes());
    bool::from(user_ok & pass_ok)
}

fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{}{}", SESSION_TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewAdminCredential;
    use crate::storage::{DocumentBackend, LocalBackend};
    use chrono::Duration;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> AdminAuthService {
        let kv = KeyValueStore::open(temp_dir.path()).unwrap();
        let backend: Arc<dyn DocumentBackend> = Arc::new(LocalBackend::new(kv.clone()));
        let cfg = Arc::new(CoreConfig::local(temp_dir.path().to_path_buf()).unwrap());
        AdminAuthService::new(Collection::new(backend), kv, cfg)
    }

    #[tokio::test]
    async fn test_login_with_default_credentials() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);

        assert!(!auth.validate_session());
        let token = auth.login("AdminRith", "5569").await.unwrap().unwrap();

        assert!(token.starts_with("hms_"));
        assert!(auth.validate_session());
        let session = auth.current_session().unwrap();
        assert_eq!(session.id, "admin_1");
        assert_eq!(session.username, "AdminRith");
        assert_eq!(session.expires_at - session.created_at, Duration::hours(24));
        assert!(auth.session_token_matches(&token));
        assert!(!auth.session_token_matches("hms_forged"));
    }

    #[tokio::test]
    async fn test_default_admin_is_persisted_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);

        auth.login("AdminRith", "5569").await.unwrap();
        auth.login("AdminRith", "5569").await.unwrap();

        let stored = auth.credentials.get_all().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "admin_1");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_prior_session_untouched() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        let token = auth.login("AdminRith", "5569").await.unwrap().unwrap();

        assert_eq!(auth.login("AdminRith", "wrong").await.unwrap(), None);
        assert_eq!(auth.login("adminrith", "5569").await.unwrap(), None);

        assert!(auth.validate_session());
        assert_eq!(auth.current_session().unwrap().token, token);
    }

    #[tokio::test]
    async fn test_failed_login_without_session_stays_logged_out() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);

        assert_eq!(auth.login("AdminRith", "").await.unwrap(), None);
        assert!(!auth.validate_session());
    }

    #[tokio::test]
    async fn test_session_invalid_after_logout() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.login("AdminRith", "5569").await.unwrap();

        auth.logout().unwrap();
        assert!(!auth.validate_session());
        assert!(auth.current_session().is_none());

        auth.logout().unwrap();
    }

    #[tokio::test]
    async fn test_session_invalid_once_expired() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.login("AdminRith", "5569").await.unwrap();
        let expires_at = auth.current_session().unwrap().expires_at;

        assert!(auth.validate_session_at(expires_at - Duration::seconds(1)));
        assert!(!auth.validate_session_at(expires_at));
        assert!(!auth.validate_session_at(expires_at + Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_corrupt_session_is_invalid() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.kv.set_item(ADMIN_SESSION_KEY, "{broken").unwrap();

        assert!(!auth.validate_session());
    }

    #[tokio::test]
    async fn test_stored_credentials_replace_default() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let auth = service(&temp_dir);
        auth.credentials
            .create(NewAdminCredential {
                username: "ward_admin".into(),
                password: "s3cret".into(),
            })
            .await
            .unwrap();

        assert_eq!(auth.login("AdminRith", "5569").await.unwrap(), None);
        assert!(auth.login("ward_admin", "s3cret").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_configured_session_ttl() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let kv = KeyValueStore::open(temp_dir.path()).unwrap();
        let backend: Arc<dyn DocumentBackend> = Arc::new(LocalBackend::new(kv.clone()));
        let cfg = CoreConfig::local(temp_dir.path().to_path_buf())
            .unwrap()
            .with_session_ttl(Duration::minutes(30));
        let auth = AdminAuthService::new(Collection::new(backend), kv, Arc::new(cfg));

        auth.login("AdminRith", "5569").await.unwrap();
        let session = auth.current_session().unwrap();
        assert_eq!(session.expires_at - session.created_at, Duration::minutes(30));
    }

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = mint_token();
        let b = mint_token();

        assert_ne!(a, b);
        assert!(a[SESSION_TOKEN_PREFIX.len()..]
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
    }
}
