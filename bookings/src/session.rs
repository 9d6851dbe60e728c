//! Session storage
//!
//! Every value kept in the browser session goes through a typed [`Slot`].
//! `take` reads and clears in one step, which is what makes flash messages
//! and the reservation summary one-shot. Storage failures are logged and
//! treated as an empty slot, so callers fall back to their "absent" path.
//!
//! The server keeps records in PostgreSQL and sweeps expired ones on a
//! timer; tests hand the router a [`tower_sessions::MemoryStore`] instead.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{AccessLevel, Reservation};
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, ExpiredDeletion, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

/// Sliding lifetime of the session cookie
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Interval between sweeps of expired session records
pub const EXPIRED_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Typed, named session value
pub struct Slot<T> {
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Slot<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T: Serialize + DeserializeOwned> Slot<T> {
    /// Store a value, replacing the previous one
    pub async fn put(&self, session: &Session, value: &T) {
        if let Err(e) = session.insert(self.key, value).await {
            tracing::warn!(key = self.key, error = %e, "Failed to write session slot");
        }
    }

    /// Read and clear the value
    pub async fn take(&self, session: &Session) -> Option<T> {
        session.remove::<T>(self.key).await.unwrap_or_else(|e| {
            tracing::warn!(key = self.key, error = %e, "Failed to take session slot");
            None
        })
    }

    /// Read the value, leaving it in place
    pub async fn peek(&self, session: &Session) -> Option<T> {
        session.get::<T>(self.key).await.unwrap_or_else(|e| {
            tracing::warn!(key = self.key, error = %e, "Failed to read session slot");
            None
        })
    }

    pub async fn clear(&self, session: &Session) {
        if let Err(e) = session.remove::<serde_json::Value>(self.key).await {
            tracing::warn!(key = self.key, error = %e, "Failed to clear session slot");
        }
    }
}

pub const FLASH: Slot<String> = Slot::new("flash");
pub const ERROR: Slot<String> = Slot::new("error");
pub const WARNING: Slot<String> = Slot::new("warning");
/// Reservation being assembled by search, choose-room and book-room
pub const RESERVATION_DRAFT: Slot<Reservation> = Slot::new("reservation_draft");
/// Committed reservation waiting for the summary page
pub const RESERVATION: Slot<Reservation> = Slot::new("reservation");
pub const USER_ID: Slot<i32> = Slot::new("user_id");
pub const ACCESS_LEVEL: Slot<AccessLevel> = Slot::new("access_level");
pub const CSRF_TOKEN: Slot<String> = Slot::new("csrf_token");
/// Owner block ids shown on the calendar, per room
pub const CALENDAR_BLOCKS: Slot<HashMap<i32, Vec<i32>>> = Slot::new("calendar_blocks");

/// One-shot user-facing messages
pub mod notify {
    use tower_sessions::Session;

    pub async fn flash(session: &Session, message: impl Into<String>) {
        super::FLASH.put(session, &message.into()).await;
    }

    pub async fn error(session: &Session, message: impl Into<String>) {
        super::ERROR.put(session, &message.into()).await;
    }

    pub async fn warning(session: &Session, message: impl Into<String>) {
        super::WARNING.put(session, &message.into()).await;
    }
}

/// True when a user is logged in on this session
pub async fn is_authenticated(session: &Session) -> bool {
    USER_ID.peek(session).await.is_some()
}

/// Cookie-backed session layer: HTTP-only, SameSite=Lax, 24h sliding expiry
pub fn session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            SESSION_LIFETIME_HOURS,
        )))
}

/// PostgreSQL session store with its table in place
pub async fn postgres_store(pool: PgPool) -> Result<PostgresStore, sqlx::Error> {
    let store = PostgresStore::new(pool);
    store.migrate().await?;
    Ok(store)
}

/// Delete expired records every `period` until the task is aborted
pub async fn sweep_expired<S: ExpiredDeletion>(store: S, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // First tick fires immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        match store.delete_expired().await {
            Ok(()) => tracing::debug!("Expired sessions swept"),
            Err(e) => tracing::warn!(error = %e, "Failed to sweep expired sessions"),
        }
    }
}
