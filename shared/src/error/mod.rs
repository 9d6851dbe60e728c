//! Unified error system for the bookings site
//!
//! - [`ErrorCode`]: Codes for every failure a handler reports
//! - [`ErrorCategory`]: Classification of errors by code range
//! - [`AppError`]: Code, guest-safe message and optional details
//! - [`ErrorResponse`]: JSON body for rejected requests
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Reservation errors
//! - 4xxx: Room errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::invalid_format("Can't parse start date");
//! assert_eq!(err.code, ErrorCode::InvalidFormat);
//! assert_eq!(AppError::new(ErrorCode::NoAvailability).message, "No availability");
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{AppError, ErrorResponse};
