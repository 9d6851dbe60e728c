//! Login and logout

use std::collections::HashMap;

use axum::extract::{Form as FormBody, State};
use axum::response::{IntoResponse, Redirect, Response};
use shared::error::AppError;
use tower_sessions::Session;

use crate::error::StoreError;
use crate::forms::Form;
use crate::render::TemplateData;
use crate::session::{ACCESS_LEVEL, USER_ID, notify};
use crate::state::AppState;

pub const LOGIN: &str = "login.page.html";

pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    state
        .renderer
        .page(&session, LOGIN, TemplateData::default())
        .await
}

pub async fn post_login(
    State(state): State<AppState>,
    session: Session,
    FormBody(fields): FormBody<HashMap<String, String>>,
) -> Response {
    // Fresh session id on every login attempt
    if let Err(e) = session.cycle_id().await {
        tracing::warn!(error = %e, "Failed to renew session id");
    }

    let mut form = Form::new(fields);
    form.required(&["email", "password"]).is_email("email");
    if !form.valid() {
        let data = TemplateData::default().with_form(form);
        return state.renderer.page(&session, LOGIN, data).await;
    }

    let email = form.get("email").trim();
    match state.repo.authenticate(email, form.get("password")).await {
        Ok((user_id, level)) => {
            tracing::info!(user_id, access_level = ?level, "User logged in");
            USER_ID.put(&session, &user_id).await;
            ACCESS_LEVEL.put(&session, &level).await;
            notify::flash(&session, "Logged in successfully").await;
            Redirect::to("/").into_response()
        }
        Err(StoreError::InvalidCredentials) => {
            tracing::warn!(email, "Invalid login attempt");
            notify::error(&session, AppError::invalid_credentials().message).await;
            Redirect::to("/user/login").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Login lookup failed");
            notify::error(&session, AppError::invalid_credentials().message).await;
            Redirect::to("/user/login").into_response()
        }
    }
}

/// Drop everything in the session
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }
    Redirect::to("/user/login").into_response()
}
