//! User Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege level stored on each user
///
/// Stored as `integer`; only [`AccessLevel::Admin`] may reach the admin area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[repr(i32)]
pub enum AccessLevel {
    Guest = 1,
    Staff = 2,
    Admin = 3,
}

impl AccessLevel {
    pub fn is_admin(self) -> bool {
        self >= AccessLevel::Admin
    }
}

/// Site user (staff account)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub password: String,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
