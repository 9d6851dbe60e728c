//! Data models
//!
//! Shared between the web application and its tests.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i32` (Postgres `serial`).

pub mod date_range;
pub mod reservation;
pub mod restriction;
pub mod room;
pub mod user;

// Re-exports
pub use date_range::*;
pub use reservation::*;
pub use restriction::*;
pub use room::*;
pub use user::*;
