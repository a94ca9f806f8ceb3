use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub division: String,
    pub title: String,
    pub email: String,
    /// Argon2 hash. Cleared before a user leaves the service layer.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn without_password(mut self) -> Self {
        self.password.clear();
        self
    }
}

/// Registration payload. Role stays a string so an unknown role is reported
/// as invalid input rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub division: String,
    pub title: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl NewUser {
    pub fn has_blank_field(&self) -> bool {
        [
            &self.name,
            &self.division,
            &self.title,
            &self.email,
            &self.password,
        ]
        .iter()
        .any(|v| v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub division: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
