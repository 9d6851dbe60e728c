//! Error types for the bookings service
//!
//! `StoreError` bridges the persistence layer (`sqlx::Error`, password hashing)
//! and the API-layer error (`AppError`). `RenderError` and `ConfigError` cover
//! the template pipeline and startup respectively.

use std::path::PathBuf;

use chrono::NaiveDate;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Failure reported by a [`crate::db::BookingRepository`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("room {room_id} is not available from {start} to {end}")]
    Unavailable {
        room_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
            || matches!(self, StoreError::Database(sqlx::Error::RowNotFound))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppError::not_found(what),
            StoreError::Database(sqlx::Error::RowNotFound) => AppError::new(ErrorCode::NotFound),
            StoreError::Unavailable { .. } => AppError::new(ErrorCode::RoomUnavailable),
            StoreError::InvalidCredentials => AppError::invalid_credentials(),
            StoreError::Database(db_err) => {
                tracing::error!(error = %db_err, "Store database error");
                AppError::new(ErrorCode::DatabaseError)
            }
            StoreError::PasswordHash(msg) => {
                tracing::error!(error = %msg, "Password hash error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

/// Failure while producing a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template {0} is not in the template cache")]
    MissingTemplate(String),
    #[error("template {name} failed to render: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("rebuilding template cache: {0}")]
    Rebuild(#[from] ConfigError),
}

/// Startup failure; the process exits with the message
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required flag --{0}")]
    MissingFlag(&'static str),
    #[error("invalid value `{value}` for --{flag}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template {name} does not compile: {source}")]
    TemplateCompile {
        name: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("template {0} not found")]
    MissingTemplate(String),
    #[error("can't connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("can't run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_masks_database_cause() {
        let err: AppError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("pool"));
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AppError = StoreError::InvalidCredentials.into();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        let start = NaiveDate::from_ymd_opt(2050, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2050, 1, 2).unwrap();
        let err: AppError = StoreError::Unavailable {
            room_id: 1,
            start,
            end,
        }
        .into();
        assert_eq!(err.code, ErrorCode::RoomUnavailable);

        assert!(StoreError::NotFound("room").is_not_found());
        assert!(StoreError::Database(sqlx::Error::RowNotFound).is_not_found());
        assert!(!StoreError::InvalidCredentials.is_not_found());
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::MissingFlag("dbname").to_string(),
            "missing required flag --dbname"
        );
        assert_eq!(
            ConfigError::MissingTemplate("home.page.html".into()).to_string(),
            "template home.page.html not found"
        );
    }
}
