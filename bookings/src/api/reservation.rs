//! Booking form and confirmation

use std::collections::HashMap;

use axum::extract::{Form, State};
use axum::response::{IntoResponse, Redirect, Response};
use shared::error::{AppError, ErrorCode};
use shared::models::Reservation;
use shared::util::format_date;
use tower_sessions::Session;

use crate::email::{guest_confirmation, owner_notice};
use crate::render::TemplateData;
use crate::session::{RESERVATION, RESERVATION_DRAFT, notify};
use crate::state::AppState;
use crate::workflow::{self, ReservationError, ValidatedDraft, Validation};

pub const MAKE_RESERVATION: &str = "make-reservation.page.html";
pub const RESERVATION_SUMMARY: &str = "reservation-summary.page.html";

async fn missing_draft(session: &Session) -> Response {
    notify::error(session, AppError::new(ErrorCode::ReservationDraftMissing).message).await;
    Redirect::to("/").into_response()
}

/// Booking form for the room and dates held in the draft
pub async fn make_reservation(State(state): State<AppState>, session: Session) -> Response {
    let Some(mut draft) = RESERVATION_DRAFT.peek(&session).await else {
        return missing_draft(&session).await;
    };

    match state.repo.get_room_by_id(draft.room_id).await {
        Ok(room) => draft.room = room,
        Err(e) => {
            tracing::warn!(room_id = draft.room_id, error = %e, "Draft room not found");
            notify::error(&session, AppError::new(ErrorCode::RoomNotFound).message).await;
            return Redirect::to("/").into_response();
        }
    }

    let data = TemplateData::default()
        .with_string("start_date", format_date(draft.start_date))
        .with_string("end_date", format_date(draft.end_date))
        .with_string("room_id", draft.room_id.to_string())
        .with_reservation(draft);
    state.renderer.page(&session, MAKE_RESERVATION, data).await
}

/// Validate, check and store a booking
pub async fn post_reservation(
    State(state): State<AppState>,
    session: Session,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let validated = match workflow::validate(fields) {
        Validation::Valid(v) => v,
        Validation::Invalid(form) => {
            let draft = RESERVATION_DRAFT.peek(&session).await;
            let reservation = workflow::typed_reservation(&form, draft);
            let data = TemplateData::default()
                .with_string("start_date", form.get("start_date"))
                .with_string("end_date", form.get("end_date"))
                .with_string("room_id", form.get("room_id"))
                .with_reservation(reservation)
                .with_form(form);
            return state.renderer.page(&session, MAKE_RESERVATION, data).await;
        }
    };

    let reservation = match book(&state, validated).await {
        Ok(reservation) => reservation,
        Err(e) => {
            match &e {
                ReservationError::Persistence(_) => {
                    tracing::error!(error = %e, "Reservation not stored")
                }
                _ => tracing::warn!(error = %e, "Reservation rejected"),
            }
            notify::error(&session, e.to_app_error().message).await;
            return Redirect::to(e.redirect_to()).into_response();
        }
    };

    tracing::info!(
        reservation_id = reservation.id,
        room_id = reservation.room_id,
        start = %reservation.start_date,
        end = %reservation.end_date,
        "Reservation stored"
    );

    // The booking stands even when mail cannot be queued
    let settings = &state.mail_settings;
    if let Err(e) = state
        .mail
        .enqueue(guest_confirmation(&reservation, &settings.from))
    {
        tracing::warn!(reservation_id = reservation.id, error = %e, "Guest confirmation not queued");
        notify::warning(&session, "Your confirmation e-mail could not be sent").await;
    }
    if let Err(e) = state
        .mail
        .enqueue(owner_notice(&reservation, &settings.from, &settings.owner))
    {
        tracing::warn!(reservation_id = reservation.id, error = %e, "Owner notice not queued");
    }

    RESERVATION.put(&session, &reservation).await;
    RESERVATION_DRAFT.clear(&session).await;
    Redirect::to("/reservation-summary").into_response()
}

async fn book(state: &AppState, validated: ValidatedDraft) -> Result<Reservation, ReservationError> {
    let repo = state.repo.as_ref();
    let available = validated.parse()?.check_availability(repo).await?;
    available.commit(repo).await
}

/// One-shot confirmation of the booking just made
pub async fn reservation_summary(State(state): State<AppState>, session: Session) -> Response {
    let Some(reservation) = RESERVATION.take(&session).await else {
        tracing::debug!("Summary requested without a stored reservation");
        return missing_draft(&session).await;
    };

    let data = TemplateData::default()
        .with_string("start_date", format_date(reservation.start_date))
        .with_string("end_date", format_date(reservation.end_date))
        .with_reservation(reservation);
    state.renderer.page(&session, RESERVATION_SUMMARY, data).await
}
