//! Room restriction Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::DateRange;

/// Why a room is unavailable for a range of nights
///
/// Matches the seeded rows of the `restrictions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[repr(i32)]
pub enum RestrictionKind {
    /// Created together with a guest reservation
    Reservation = 1,
    /// Manual block placed by the owner from the calendar
    OwnerBlock = 2,
}

impl RestrictionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Reservation => "Reservation",
            Self::OwnerBlock => "Owner Block",
        }
    }
}

/// Range of nights during which a room cannot be booked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoomRestriction {
    pub id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_id: i32,
    /// Set only for [`RestrictionKind::Reservation`]
    pub reservation_id: Option<i32>,
    #[cfg_attr(feature = "db", sqlx(rename = "restriction_id"))]
    pub kind: RestrictionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomRestriction {
    /// Unsaved restriction (`id` is assigned by the store)
    pub fn new(
        room_id: i32,
        range: DateRange,
        kind: RestrictionKind,
        reservation_id: Option<i32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            start_date: range.start,
            end_date: range.end,
            room_id,
            reservation_id,
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}
