//! Error codes raised by the bookings site
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Reservation errors
//! - 4xxx: Room errors
//! - 9xxx: System errors

use std::fmt;

/// Unified error code enum
///
/// Codes are u16 values so they travel unchanged in JSON error bodies and
/// log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Resource not found
    NotFound = 3,
    /// Invalid format (malformed date or id)
    InvalidFormat = 6,
    /// Anti-forgery token missing or wrong
    CsrfTokenInvalid = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,

    // ==================== 3xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 3001,
    /// No reservation draft in the session
    ReservationDraftMissing = 3002,
    /// Departure is not after arrival
    InvalidDateRange = 3003,
    /// Reservation could not be stored
    ReservationNotSaved = 3004,

    // ==================== 4xxx: Room ====================
    /// Room not found
    RoomNotFound = 4001,
    /// Room already booked for the requested dates
    RoomUnavailable = 4002,
    /// No room is free for the requested dates
    NoAvailability = 4003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::CsrfTokenInvalid => "Invalid or missing form token",

            // Auth
            ErrorCode::NotAuthenticated => "Log in first!",
            ErrorCode::InvalidCredentials => "Invalid login credentials",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationDraftMissing => "Can't get reservation from session",
            ErrorCode::InvalidDateRange => "Departure date must be after arrival date",
            ErrorCode::ReservationNotSaved => "Can't insert reservation into database",

            // Room
            ErrorCode::RoomNotFound => "Invalid room",
            ErrorCode::RoomUnavailable => "Room is not available for those dates",
            ErrorCode::NoAvailability => "No availability",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
