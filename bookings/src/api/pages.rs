//! Informational pages

use axum::extract::State;
use axum::response::Response;
use tower_sessions::Session;

use crate::render::TemplateData;
use crate::state::AppState;

pub const HOME: &str = "home.page.html";
pub const ABOUT: &str = "about.page.html";
pub const GENERALS: &str = "generals.page.html";
pub const MAJORS: &str = "majors.page.html";
pub const CONTACT: &str = "contact.page.html";

pub async fn home(State(state): State<AppState>, session: Session) -> Response {
    state.renderer.page(&session, HOME, TemplateData::default()).await
}

pub async fn about(State(state): State<AppState>, session: Session) -> Response {
    state.renderer.page(&session, ABOUT, TemplateData::default()).await
}

/// General's Quarters room page
pub async fn generals(State(state): State<AppState>, session: Session) -> Response {
    state.renderer.page(&session, GENERALS, TemplateData::default()).await
}

/// Major's Suite room page
pub async fn majors(State(state): State<AppState>, session: Session) -> Response {
    state.renderer.page(&session, MAJORS, TemplateData::default()).await
}

pub async fn contact(State(state): State<AppState>, session: Session) -> Response {
    state.renderer.page(&session, CONTACT, TemplateData::default()).await
}
