//! Room Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookable room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Room {
    pub id: i32,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(id: i32, room_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            room_name: room_name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
