//! Shared types for the bookings site
//!
//! Domain models (rooms, reservations, restrictions, users), the unified
//! error system and small utilities used by the web application and its tests.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, ErrorCategory, ErrorCode};
pub use models::{
    AccessLevel, DateRange, Reservation, RestrictionKind, Room, RoomRestriction, User,
};
