//! bookings - bed & breakfast reservation site
//!
//! Server-rendered pages for searching availability and booking one of the
//! rooms, plus an administrator area for reviewing reservations and blocking
//! nights on a month calendar.

pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod csrf;
pub mod db;
pub mod email;
pub mod error;
pub mod forms;
pub mod render;
pub mod session;
pub mod state;
pub mod util;
pub mod workflow;
