//! Admin area guard

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use shared::error::{AppError, ErrorCode};
use tower_sessions::Session;

use crate::session::{ACCESS_LEVEL, USER_ID, notify};

/// Middleware letting only logged-in administrators through
///
/// Anyone else gets the "Log in first!" error flash and is sent to the
/// login page.
pub async fn require_admin(session: Session, request: Request, next: Next) -> Response {
    let user_id = USER_ID.peek(&session).await;
    let is_admin = ACCESS_LEVEL
        .peek(&session)
        .await
        .is_some_and(|level| level.is_admin());

    match user_id {
        Some(_) if is_admin => next.run(request).await,
        Some(user_id) => {
            tracing::warn!(user_id, path = %request.uri().path(), "Non-admin user denied");
            notify::error(&session, AppError::new(ErrorCode::NotAuthenticated).message).await;
            Redirect::to("/user/login").into_response()
        }
        None => {
            notify::error(&session, AppError::new(ErrorCode::NotAuthenticated).message).await;
            Redirect::to("/user/login").into_response()
        }
    }
}
