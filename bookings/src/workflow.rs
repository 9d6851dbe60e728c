//! Reservation workflow
//!
//! A booking moves through typed steps, each consuming the previous one:
//!
//! ```text
//! validate(fields) -> ValidatedDraft --parse--> BookingRequest
//!     --check_availability--> AvailableBooking --commit--> Reservation
//! ```
//!
//! Validation failures are returned as a [`Form`] to re-render; every later
//! failure is a [`ReservationError`] that knows where to send the guest.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{DateRange, DateRangeError, Reservation, Room};
use shared::util::parse_date;

use crate::db::BookingRepository;
use crate::error::StoreError;
use crate::forms::Form;

pub const REQUIRED_FIELDS: [&str; 4] = ["first_name", "last_name", "email", "phone"];
pub const FIRST_NAME_MIN_LENGTH: usize = 3;

/// Request-scoped booking failure
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("can't parse start date `{0}`")]
    InvalidStartDate(String),
    #[error("can't parse end date `{0}`")]
    InvalidEndDate(String),
    #[error("invalid room id `{0}`")]
    InvalidRoomId(String),
    #[error(transparent)]
    InvalidRange(#[from] DateRangeError),
    #[error("room lookup failed: {0}")]
    RoomNotFound(#[source] StoreError),
    #[error("room {room_id} is not available for the requested dates")]
    Unavailable { room_id: i32 },
    #[error("can't store reservation: {0}")]
    Persistence(#[source] StoreError),
}

impl ReservationError {
    /// Page the guest is redirected to
    pub fn redirect_to(&self) -> &'static str {
        match self {
            ReservationError::Unavailable { .. } => "/search-availability",
            _ => "/",
        }
    }

    /// Message safe to show in the error flash
    pub fn to_app_error(&self) -> AppError {
        match self {
            ReservationError::InvalidStartDate(_) => {
                AppError::with_message(ErrorCode::InvalidFormat, "Can't parse start date")
            }
            ReservationError::InvalidEndDate(_) => {
                AppError::with_message(ErrorCode::InvalidFormat, "Can't parse end date")
            }
            ReservationError::InvalidRoomId(_) => {
                AppError::with_message(ErrorCode::InvalidFormat, "Invalid data!")
            }
            ReservationError::InvalidRange(_) => AppError::new(ErrorCode::InvalidDateRange),
            ReservationError::RoomNotFound(_) => AppError::new(ErrorCode::RoomNotFound),
            ReservationError::Unavailable { .. } => AppError::new(ErrorCode::RoomUnavailable),
            ReservationError::Persistence(_) => AppError::new(ErrorCode::ReservationNotSaved),
        }
    }
}

/// Guest details that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Outcome of validating the posted booking form
#[derive(Debug)]
pub enum Validation {
    Valid(ValidatedDraft),
    Invalid(Form),
}

/// Apply the booking form rules
pub fn validate(fields: HashMap<String, String>) -> Validation {
    let mut form = Form::new(fields);
    form.required(&REQUIRED_FIELDS)
        .min_length("first_name", FIRST_NAME_MIN_LENGTH)
        .is_email("email");
    if form.valid() {
        Validation::Valid(ValidatedDraft { form })
    } else {
        Validation::Invalid(form)
    }
}

/// Reservation built from the typed values, for re-rendering the form
///
/// Dates and room come from the session draft when there is one.
pub fn typed_reservation(form: &Form, draft: Option<Reservation>) -> Reservation {
    let mut reservation = draft.unwrap_or_default();
    reservation.first_name = form.get("first_name").to_string();
    reservation.last_name = form.get("last_name").to_string();
    reservation.email = form.get("email").to_string();
    reservation.phone = form.get("phone").to_string();
    reservation
}

#[derive(Debug)]
pub struct ValidatedDraft {
    form: Form,
}

impl ValidatedDraft {
    /// Parse dates (`YYYY-MM-DD`) and room id
    pub fn parse(self) -> Result<BookingRequest, ReservationError> {
        let f = &self.form;
        let start = parse_date(f.get("start_date"))
            .map_err(|_| ReservationError::InvalidStartDate(f.get("start_date").to_string()))?;
        let end = parse_date(f.get("end_date"))
            .map_err(|_| ReservationError::InvalidEndDate(f.get("end_date").to_string()))?;
        let room_id: i32 = f
            .get("room_id")
            .trim()
            .parse()
            .map_err(|_| ReservationError::InvalidRoomId(f.get("room_id").to_string()))?;
        let range = DateRange::new(start, end)?;

        Ok(BookingRequest {
            guest: Guest {
                first_name: f.get("first_name").trim().to_string(),
                last_name: f.get("last_name").trim().to_string(),
                email: f.get("email").trim().to_string(),
                phone: f.get("phone").trim().to_string(),
            },
            room_id,
            range,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub guest: Guest,
    pub room_id: i32,
    pub range: DateRange,
}

impl BookingRequest {
    /// Look up the room and make sure its nights are free
    pub async fn check_availability(
        self,
        repo: &dyn BookingRepository,
    ) -> Result<AvailableBooking, ReservationError> {
        let room = repo
            .get_room_by_id(self.room_id)
            .await
            .map_err(ReservationError::RoomNotFound)?;

        let available = repo
            .search_availability_by_dates_by_room_id(self.range, self.room_id)
            .await
            .map_err(ReservationError::Persistence)?;
        if !available {
            return Err(ReservationError::Unavailable {
                room_id: self.room_id,
            });
        }

        Ok(AvailableBooking {
            request: self,
            room,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AvailableBooking {
    request: BookingRequest,
    room: Room,
}

impl AvailableBooking {
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Store the reservation and its restriction as one unit
    pub async fn commit(self, repo: &dyn BookingRepository) -> Result<Reservation, ReservationError> {
        let guest = self.request.guest;
        let mut reservation = Reservation::draft(self.room.clone(), self.request.range);
        reservation.first_name = guest.first_name;
        reservation.last_name = guest.last_name;
        reservation.email = guest.email;
        reservation.phone = guest.phone;

        let mut committed = repo
            .commit_reservation(&reservation)
            .await
            .map_err(|e| match e {
                StoreError::Unavailable { room_id, .. } => ReservationError::Unavailable { room_id },
                other => ReservationError::Persistence(other),
            })?;
        committed.room = self.room;
        Ok(committed)
    }
}
