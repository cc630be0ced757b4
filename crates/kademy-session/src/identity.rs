//! The authenticated user and the payloads of identity mutations.
//!
//! [`Identity`] is derived state: it's fetched from the profile endpoint
//! with the current access token and only exists while a credential pair
//! does.

use std::fmt;

use kademy_store::CredentialPair;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user's role. Unknown roles from a newer backend map to `Other`
/// instead of failing the whole profile decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    InstituteAdmin,
    Teacher,
    #[default]
    Student,
    #[serde(other)]
    Other,
}

/// Backend user ids have been both integers and UUID strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{n}"),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// Extended profile fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileDetails {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

/// The authenticated user, as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub id: Option<UserId>,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub profile: Option<ProfileDetails>,
    #[serde(default)]
    pub memberships: Vec<Value>,
}

impl Identity {
    /// Name to show in the UI: `full_name`, else `first last`, else email.
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return full.to_string();
        }
        let joined = format!("{} {}", self.first_name, self.last_name);
        let joined = joined.trim();
        if joined.is_empty() {
            self.email.clone()
        } else {
            joined.to_string()
        }
    }
}

/// Body of a successful login: the user and a fresh pair.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub(crate) user: Identity,
    pub(crate) tokens: CredentialPair,
}

/// Body of a successful refresh exchange.
///
/// `refresh` is present only when the backend rotates refresh tokens.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub(crate) access: String,
    #[serde(default)]
    pub(crate) refresh: Option<String>,
}

// ---------------------------------------------------------------------------
// Mutation payloads
// ---------------------------------------------------------------------------

/// New-account data for [`register`](crate::SessionManager::register).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// A partial profile update. `None` fields are left out of the request
/// and stay unchanged on the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Payload for [`change_password`](crate::SessionManager::change_password).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}
