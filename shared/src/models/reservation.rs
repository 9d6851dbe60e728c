//! Reservation Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{DateRange, Room};

/// Guest reservation
///
/// Also used as the in-progress draft kept in the session, in which case
/// `id` is `0` and the guest fields may still be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_id: i32,
    pub room: Room,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Draft for a room and stay, before guest details are known
    pub fn draft(room: Room, range: DateRange) -> Self {
        Self {
            room_id: room.id,
            room,
            start_date: range.start,
            end_date: range.end,
            ..Default::default()
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_copies_room_and_dates() {
        let start = NaiveDate::from_ymd_opt(2050, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2050, 1, 2).unwrap();
        let draft = Reservation::draft(Room::new(1, "General's Quarters"), DateRange::new(start, end).unwrap());

        assert_eq!(draft.id, 0);
        assert_eq!(draft.room_id, 1);
        assert_eq!(draft.room.room_name, "General's Quarters");
        assert_eq!(draft.range().nights(), 1);
        assert!(!draft.processed);
        assert!(draft.first_name.is_empty());
    }

    #[test]
    fn test_session_round_trip_keeps_dates() {
        let start = NaiveDate::from_ymd_opt(2050, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2050, 6, 4).unwrap();
        let mut draft = Reservation::draft(Room::new(2, "Major's Suite"), DateRange::new(start, end).unwrap());
        draft.first_name = "Omama".into();

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["start_date"], "2050-06-01");
        let back: Reservation = serde_json::from_value(value).unwrap();
        assert_eq!(back, draft);
    }
}
