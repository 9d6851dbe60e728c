//! HTTP routes for the bookings site

pub mod admin;
pub mod availability;
pub mod health;
pub mod pages;
pub mod reservation;
pub mod user;

use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::auth::require_admin;
use crate::csrf::csrf_guard;
use crate::session::session_layer;
use crate::state::AppState;

/// Every page template the routes render; checked at startup
pub const PAGES: &[&str] = &[
    pages::HOME,
    pages::ABOUT,
    pages::GENERALS,
    pages::MAJORS,
    pages::CONTACT,
    availability::SEARCH_AVAILABILITY,
    availability::CHOOSE_ROOM,
    reservation::MAKE_RESERVATION,
    reservation::RESERVATION_SUMMARY,
    user::LOGIN,
    admin::DASHBOARD,
    admin::NEW_RESERVATIONS,
    admin::ALL_RESERVATIONS,
    admin::SHOW_RESERVATION,
    admin::CALENDAR,
];

/// Create the combined router over the given session store
pub fn create_router<S>(state: AppState, sessions: S) -> Router
where
    S: SessionStore + Clone,
{
    // Admin area (logged-in administrators only)
    let admin = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/reservations-new", get(admin::new_reservations))
        .route("/reservations-all", get(admin::all_reservations))
        .route(
            "/reservations-calendar",
            get(admin::calendar).post(admin::post_calendar),
        )
        .route("/process-reservation/{src}/{id}/do", get(admin::process_reservation))
        .route("/delete-reservation/{src}/{id}/do", get(admin::delete_reservation))
        .route("/reservations/{src}/{id}/show", get(admin::show_reservation))
        .route("/reservations/{src}/{id}", post(admin::post_reservation))
        .route_layer(middleware::from_fn(require_admin));

    // Guest pages
    let site = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/generals-quarters", get(pages::generals))
        .route("/majors-suite", get(pages::majors))
        .route("/contact", get(pages::contact))
        .route(
            "/search-availability",
            get(availability::availability).post(availability::post_availability),
        )
        .route("/search-availability-json", post(availability::availability_json))
        .route("/choose-room/{id}", get(availability::choose_room))
        .route("/book-room", get(availability::book_room))
        .route(
            "/make-reservation",
            get(reservation::make_reservation).post(reservation::post_reservation),
        )
        .route("/reservation-summary", get(reservation::reservation_summary))
        .route("/user/login", get(user::login).post(user::post_login))
        .route("/user/logout", get(user::logout));

    let assets = ServeDir::new(&state.asset_dir);
    let secure_cookies = state.in_production;

    Router::new()
        .route("/health", get(health::health_check))
        .merge(site)
        .nest("/admin", admin)
        .nest_service("/assets", assets)
        .layer(middleware::from_fn(csrf_guard))
        .layer(session_layer(sessions, secure_cookies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
