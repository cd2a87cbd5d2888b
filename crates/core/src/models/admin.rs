use super::{require, Entity};
use crate::storage::CollectionKind;
use crate::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored admin login. The password is kept as entered; this is a shared-credential gate,
/// not an identity system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredential {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdminCredential {
    pub username: String,
    pub password: String,
}

impl Entity for AdminCredential {
    type New = NewAdminCredential;
    const KIND: CollectionKind = CollectionKind::AdminAuth;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_new(new: &NewAdminCredential) -> StoreResult<()> {
        require("username", &new.username)?;
        require("password", &new.password)
    }

    fn from_new(id: String, now: DateTime<Utc>, new: NewAdminCredential) -> Self {
        Self {
            id,
            username: new.username,
            password: new.password,
            created_at: now,
        }
    }
}

/// The cached login session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    /// Id of the credential that logged in.
    pub id: String,
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_wire_format() {
        let now = Utc::now();
        let session = AdminSession {
            id: "admin_1".into(),
            username: "AdminRith".into(),
            token: "hms_abc".into(),
            expires_at: now + Duration::hours(24),
            created_at: now,
        };

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["username"], "AdminRith");
        assert!(value.get("expiresAt").is_some());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_session_expires_at_boundary() {
        let now = Utc::now();
        let session = AdminSession {
            id: "admin_1".into(),
            username: "AdminRith".into(),
            token: "t".into(),
            expires_at: now,
            created_at: now - Duration::hours(24),
        };

        assert!(session.is_valid_at(now - Duration::milliseconds(1)));
        assert!(!session.is_valid_at(now));
    }
}
