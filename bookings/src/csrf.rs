//! Anti-forgery tokens
//!
//! Each session carries one random token. Rendered pages embed it, and
//! state-changing requests must echo it back in the `csrf_token` form field
//! or the `X-CSRF-Token` header.

use std::collections::HashMap;

use axum::body::{Body, to_bytes};
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Form;
use rand::RngCore;
use shared::error::{AppError, ErrorCode};
use tower_sessions::Session;

use crate::session::CSRF_TOKEN;

pub const FORM_FIELD: &str = "csrf_token";
pub const HEADER: &str = "x-csrf-token";

/// Largest form body buffered for token inspection
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Session token, created on first use
pub async fn token(session: &Session) -> String {
    if let Some(token) = CSRF_TOKEN.peek(session).await {
        return token;
    }
    let token = generate_token();
    CSRF_TOKEN.put(session, &token).await;
    token
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time comparison of two tokens
fn tokens_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn rejected(method: &Method, path: &str) -> Response {
    tracing::warn!(%method, path, "Rejected request with invalid CSRF token");
    AppError::new(ErrorCode::CsrfTokenInvalid)
        .with_detail("path", path)
        .into_response()
}

/// Middleware verifying the token on POST/PUT/PATCH/DELETE
///
/// Must run inside the session layer. Form bodies are buffered, inspected
/// and handed on unchanged.
pub async fn csrf_guard(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    if matches!(method, Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(request).await;
    }
    let path = request.uri().path().to_string();

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        tracing::error!(path, "CSRF guard installed outside the session layer");
        return rejected(&method, &path);
    };
    let Some(expected) = CSRF_TOKEN.peek(&session).await else {
        return rejected(&method, &path);
    };

    if let Some(presented) = request
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if tokens_match(&expected, presented) {
            return next.run(request).await;
        }
        return rejected(&method, &path);
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path, error = %e, "Failed to buffer request body");
            return rejected(&method, &path);
        }
    };

    let is_form = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return rejected(&method, &path);
    }

    let mut form_request = Request::new(Body::from(bytes.clone()));
    *form_request.method_mut() = Method::POST;
    form_request.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    let presented = match Form::<HashMap<String, String>>::from_request(form_request, &()).await {
        Ok(Form(fields)) => fields.get(FORM_FIELD).cloned(),
        Err(_) => None,
    };

    match presented {
        Some(presented) if tokens_match(&expected, &presented) => {
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        _ => rejected(&method, &path),
    }
}
