//! Availability search and room selection

use axum::Json;
use axum::extract::{Form, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{DateRange, Reservation};
use shared::util::{format_date, parse_date};
use tower_sessions::Session;

use crate::render::TemplateData;
use crate::session::{RESERVATION, RESERVATION_DRAFT, notify};
use crate::state::AppState;

pub const SEARCH_AVAILABILITY: &str = "search-availability.page.html";
pub const CHOOSE_ROOM: &str = "choose-room.page.html";

#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub room_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookRoomQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub s: String,
    #[serde(default)]
    pub e: String,
}

/// Body of the availability JSON endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub ok: bool,
    pub message: String,
    pub room_id: String,
    pub start_date: String,
    pub end_date: String,
}

/// Parse a `YYYY-MM-DD` pair into a stay
pub(crate) fn parse_range(start: &str, end: &str) -> Result<DateRange, AppError> {
    let start = parse_date(start)
        .map_err(|_| AppError::invalid_format("Can't parse start date"))?;
    let end = parse_date(end).map_err(|_| AppError::invalid_format("Can't parse end date"))?;
    DateRange::new(start, end).map_err(|_| AppError::new(ErrorCode::InvalidDateRange))
}

pub(crate) fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_format("Invalid data!"))
}

async fn fail(session: &Session, err: AppError, to: &str) -> Response {
    notify::error(session, err.message).await;
    Redirect::to(to).into_response()
}

pub async fn availability(State(state): State<AppState>, session: Session) -> Response {
    state
        .renderer
        .page(&session, SEARCH_AVAILABILITY, TemplateData::default())
        .await
}

/// List the rooms free for the posted stay
pub async fn post_availability(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SearchForm>,
) -> Response {
    let range = match parse_range(&form.start, &form.end) {
        Ok(range) => range,
        Err(e) => return fail(&session, e, "/").await,
    };

    let rooms = match state.repo.search_availability_for_all_rooms(range).await {
        Ok(rooms) => rooms,
        Err(e) => {
            tracing::error!(error = %e, "Availability search failed");
            let err = AppError::with_message(
                ErrorCode::DatabaseError,
                "Can't get availability for rooms",
            );
            return fail(&session, err, "/").await;
        }
    };

    if rooms.is_empty() {
        tracing::debug!(start = %range.start, end = %range.end, "No rooms free");
        return fail(
            &session,
            AppError::new(ErrorCode::NoAvailability),
            "/search-availability",
        )
        .await;
    }

    let draft = Reservation {
        start_date: range.start,
        end_date: range.end,
        ..Reservation::default()
    };
    RESERVATION_DRAFT.put(&session, &draft).await;
    RESERVATION.clear(&session).await;

    let data = TemplateData::default()
        .with_rooms(rooms)
        .with_string("start_date", format_date(range.start))
        .with_string("end_date", format_date(range.end));
    state.renderer.page(&session, CHOOSE_ROOM, data).await
}

/// Availability of one room, for the room pages
pub async fn availability_json(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Json<AvailabilityResponse> {
    let mut body = AvailabilityResponse {
        ok: false,
        message: String::new(),
        room_id: form.room_id.clone(),
        start_date: form.start.clone(),
        end_date: form.end.clone(),
    };

    let parsed = parse_range(&form.start, &form.end)
        .and_then(|range| parse_id(&form.room_id).map(|id| (range, id)));
    let (range, room_id) = match parsed {
        Ok(v) => v,
        Err(e) => {
            body.message = e.message;
            return Json(body);
        }
    };

    match state
        .repo
        .search_availability_by_dates_by_room_id(range, room_id)
        .await
    {
        Ok(ok) => {
            body.ok = ok;
            body.start_date = format_date(range.start);
            body.end_date = format_date(range.end);
        }
        Err(e) => {
            tracing::error!(room_id, error = %e, "Availability lookup failed");
            body.message = "Error querying database".to_string();
        }
    }
    Json(body)
}

/// Pick a room from the search results
pub async fn choose_room(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let room_id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return fail(&session, e, "/").await,
    };

    let Some(mut draft) = RESERVATION_DRAFT.peek(&session).await else {
        return fail(&session, AppError::new(ErrorCode::ReservationDraftMissing), "/").await;
    };

    let room = match state.repo.get_room_by_id(room_id).await {
        Ok(room) => room,
        Err(e) => {
            tracing::warn!(room_id, error = %e, "Chosen room not found");
            return fail(&session, AppError::new(ErrorCode::RoomNotFound), "/").await;
        }
    };

    draft.room_id = room.id;
    draft.room = room;
    RESERVATION_DRAFT.put(&session, &draft).await;
    Redirect::to("/make-reservation").into_response()
}

/// Start a booking straight from a room page link (`?id=&s=&e=`)
pub async fn book_room(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BookRoomQuery>,
) -> Response {
    let room_id = match parse_id(&query.id) {
        Ok(id) => id,
        Err(e) => return fail(&session, e, "/").await,
    };
    let range = match parse_range(&query.s, &query.e) {
        Ok(range) => range,
        Err(e) => return fail(&session, e, "/").await,
    };

    let room = match state.repo.get_room_by_id(room_id).await {
        Ok(room) => room,
        Err(e) => {
            tracing::warn!(room_id, error = %e, "Booked room not found");
            return fail(&session, AppError::new(ErrorCode::RoomNotFound), "/").await;
        }
    };

    RESERVATION_DRAFT
        .put(&session, &Reservation::draft(room, range))
        .await;
    RESERVATION.clear(&session).await;
    Redirect::to("/make-reservation").into_response()
}
