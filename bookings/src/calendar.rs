//! Month view for the admin reservations calendar

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use shared::models::{DateRange, RestrictionKind, Room, RoomRestriction};
use shared::util::format_date;

/// One night of one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    /// Reservation occupying the night, if any
    pub reservation_id: Option<i32>,
    /// Owner block covering the night, if any
    pub block_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomMonth {
    pub room: Room,
    pub days: Vec<DayCell>,
}

/// Every room's nights for a calendar month
#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub days_in_month: u32,
    pub prev_year: i32,
    pub prev_month: u32,
    pub next_year: i32,
    pub next_month: u32,
    pub rooms: Vec<RoomMonth>,
    #[serde(skip)]
    range: DateRange,
}

impl MonthView {
    /// Empty view; `None` for an impossible year/month
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = first.checked_add_months(Months::new(1))?;
        let prev = first.checked_sub_months(Months::new(1))?;
        let range = DateRange::new(first, next).ok()?;

        Some(Self {
            year,
            month,
            month_name: first.format("%B").to_string(),
            days_in_month: range.nights() as u32,
            prev_year: prev.year(),
            prev_month: prev.month(),
            next_year: next.year(),
            next_month: next.month(),
            rooms: Vec::new(),
            range,
        })
    }

    /// Nights covered by the month
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Add a room, marking nights taken by the given restrictions
    pub fn push_room(&mut self, room: Room, restrictions: &[RoomRestriction]) {
        let days = self
            .range
            .nights_iter()
            .map(|night| {
                let mut cell = DayCell {
                    day: night.day(),
                    date: format_date(night),
                    reservation_id: None,
                    block_id: None,
                };
                for r in restrictions.iter().filter(|r| r.range().contains_night(night)) {
                    match r.kind {
                        RestrictionKind::Reservation => cell.reservation_id = r.reservation_id,
                        RestrictionKind::OwnerBlock => cell.block_id = Some(r.id),
                    }
                }
                cell
            })
            .collect();
        self.rooms.push(RoomMonth { room, days });
    }

    /// Owner block ids visible in this view, per room
    pub fn block_ids(&self) -> HashMap<i32, Vec<i32>> {
        self.rooms
            .iter()
            .map(|rm| {
                let mut ids: Vec<i32> = rm.days.iter().filter_map(|d| d.block_id).collect();
                ids.dedup();
                (rm.room.id, ids)
            })
            .collect()
    }
}
