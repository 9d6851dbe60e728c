//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::ReservationNotFound | Self::RoomNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::RoomUnavailable => StatusCode::CONFLICT,

            Self::NotAuthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::InternalError | Self::DatabaseError | Self::ReservationNotSaved => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/format errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
