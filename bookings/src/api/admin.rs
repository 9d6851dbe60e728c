//! Administrator area
//!
//! Reservation pages take a `{src}` path segment naming the list the
//! administrator came from (`new`, `all` or `cal`) so every action can send
//! them back there. Calendar round trips also carry the month as `y`/`m`.

use std::collections::HashMap;

use axum::extract::{Form as FormBody, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Datelike, Local};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::util::parse_date;
use tower_sessions::Session;

use crate::calendar::MonthView;
use crate::error::StoreError;
use crate::forms::Form;
use crate::render::TemplateData;
use crate::session::{CALENDAR_BLOCKS, notify};
use crate::state::AppState;
use crate::workflow::{self, FIRST_NAME_MIN_LENGTH, REQUIRED_FIELDS};

use super::availability::parse_id;

pub const DASHBOARD: &str = "admin-dashboard.page.html";
pub const NEW_RESERVATIONS: &str = "admin-new-reservations.page.html";
pub const ALL_RESERVATIONS: &str = "admin-all-reservations.page.html";
pub const SHOW_RESERVATION: &str = "admin-reservations-show.page.html";
pub const CALENDAR: &str = "admin-reservations-calendar.page.html";

const REMOVE_BLOCK_PREFIX: &str = "remove_block_";
const ADD_BLOCK_PREFIX: &str = "add_block_";

/// List a reservation action was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSource {
    New,
    All,
    Calendar,
}

impl ReviewSource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(Self::New),
            "all" => Some(Self::All),
            "cal" => Some(Self::Calendar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::All => "all",
            Self::Calendar => "cal",
        }
    }

    /// Where to go once the action is done
    pub fn back_to(&self, month: &MonthQuery) -> String {
        match self {
            Self::New => "/admin/reservations-new".to_string(),
            Self::All => "/admin/reservations-all".to_string(),
            Self::Calendar => match month.parsed() {
                Some((y, m)) => format!("/admin/reservations-calendar?y={y}&m={m}"),
                None => "/admin/reservations-calendar".to_string(),
            },
        }
    }
}

/// `?y=2050&m=1`
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub m: Option<String>,
}

impl MonthQuery {
    fn parsed(&self) -> Option<(i32, u32)> {
        let y = self.y.as_deref()?.trim().parse().ok()?;
        let m = self.m.as_deref()?.trim().parse().ok()?;
        Some((y, m))
    }

    /// Requested month, or the current one
    fn view(&self) -> Option<MonthView> {
        self.parsed()
            .and_then(|(y, m)| MonthView::new(y, m))
            .or_else(|| {
                let today = Local::now().date_naive();
                MonthView::new(today.year(), today.month())
            })
    }
}

struct Target {
    source: ReviewSource,
    id: i32,
}

/// Resolve `{src}/{id}`; on failure the guest is already redirected
async fn target(session: &Session, src: &str, id: &str) -> Result<Target, Response> {
    let source = ReviewSource::parse(src);
    let id = parse_id(id);
    match (source, id) {
        (Some(source), Ok(id)) => Ok(Target { source, id }),
        _ => {
            tracing::warn!(src, "Malformed admin reservation path");
            notify::error(session, "Invalid data!").await;
            Err(Redirect::to("/admin/dashboard").into_response())
        }
    }
}

pub async fn dashboard(State(state): State<AppState>, session: Session) -> Response {
    state
        .renderer
        .page(&session, DASHBOARD, TemplateData::default())
        .await
}

pub async fn new_reservations(State(state): State<AppState>, session: Session) -> Response {
    let reservations = match state.repo.all_new_reservations().await {
        Ok(list) => list,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list new reservations");
            notify::error(&session, AppError::new(ErrorCode::DatabaseError).message).await;
            Vec::new()
        }
    };
    let data = TemplateData::default().with_reservations(reservations);
    state.renderer.page(&session, NEW_RESERVATIONS, data).await
}

pub async fn all_reservations(State(state): State<AppState>, session: Session) -> Response {
    let reservations = match state.repo.all_reservations().await {
        Ok(list) => list,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list reservations");
            notify::error(&session, AppError::new(ErrorCode::DatabaseError).message).await;
            Vec::new()
        }
    };
    let data = TemplateData::default().with_reservations(reservations);
    state.renderer.page(&session, ALL_RESERVATIONS, data).await
}

fn show_data(source: ReviewSource, month: &MonthQuery) -> TemplateData {
    TemplateData::default()
        .with_string("src", source.as_str())
        .with_string("year", month.y.clone().unwrap_or_default())
        .with_string("month", month.m.clone().unwrap_or_default())
}

pub async fn show_reservation(
    State(state): State<AppState>,
    session: Session,
    Path((src, id)): Path<(String, String)>,
    Query(month): Query<MonthQuery>,
) -> Response {
    let target = match target(&session, &src, &id).await {
        Ok(t) => t,
        Err(response) => return response,
    };

    let reservation = match state.repo.get_reservation_by_id(target.id).await {
        Ok(r) => r,
        Err(e) => return lookup_failed(&session, target.id, e).await,
    };

    let data = show_data(target.source, &month).with_reservation(reservation);
    state.renderer.page(&session, SHOW_RESERVATION, data).await
}

async fn lookup_failed(session: &Session, id: i32, e: StoreError) -> Response {
    if e.is_not_found() {
        tracing::warn!(reservation_id = id, "Reservation not found");
        notify::error(session, AppError::new(ErrorCode::ReservationNotFound).message).await;
    } else {
        tracing::warn!(reservation_id = id, "Reservation lookup failed");
        notify::error(session, AppError::from(e).message).await;
    }
    Redirect::to("/admin/dashboard").into_response()
}

/// Save edits to a reservation's guest details
pub async fn post_reservation(
    State(state): State<AppState>,
    session: Session,
    Path((src, id)): Path<(String, String)>,
    FormBody(fields): FormBody<HashMap<String, String>>,
) -> Response {
    let target = match target(&session, &src, &id).await {
        Ok(t) => t,
        Err(response) => return response,
    };
    let month = MonthQuery {
        y: fields.get("year").cloned(),
        m: fields.get("month").cloned(),
    };

    let stored = match state.repo.get_reservation_by_id(target.id).await {
        Ok(r) => r,
        Err(e) => return lookup_failed(&session, target.id, e).await,
    };

    let mut form = Form::new(fields);
    form.required(&REQUIRED_FIELDS)
        .min_length("first_name", FIRST_NAME_MIN_LENGTH)
        .is_email("email");
    if !form.valid() {
        let reservation = workflow::typed_reservation(&form, Some(stored));
        let data = show_data(target.source, &month)
            .with_reservation(reservation)
            .with_form(form);
        return state.renderer.page(&session, SHOW_RESERVATION, data).await;
    }

    let mut reservation = stored;
    reservation.first_name = form.get("first_name").trim().to_string();
    reservation.last_name = form.get("last_name").trim().to_string();
    reservation.email = form.get("email").trim().to_string();
    reservation.phone = form.get("phone").trim().to_string();

    match state.repo.update_reservation(&reservation).await {
        Ok(()) => {
            tracing::info!(reservation_id = reservation.id, "Reservation updated");
            notify::flash(&session, "Changes saved").await;
        }
        Err(e) => {
            tracing::warn!(reservation_id = reservation.id, "Reservation update failed");
            notify::error(&session, AppError::from(e).message).await;
        }
    }
    Redirect::to(&target.source.back_to(&month)).into_response()
}

pub async fn process_reservation(
    State(state): State<AppState>,
    session: Session,
    Path((src, id)): Path<(String, String)>,
    Query(month): Query<MonthQuery>,
) -> Response {
    let target = match target(&session, &src, &id).await {
        Ok(t) => t,
        Err(response) => return response,
    };

    match state
        .repo
        .update_processed_for_reservation(target.id, true)
        .await
    {
        Ok(()) => {
            tracing::info!(reservation_id = target.id, "Reservation processed");
            notify::flash(&session, "Reservation marked as processed").await;
        }
        Err(e) => return lookup_failed(&session, target.id, e).await,
    }
    Redirect::to(&target.source.back_to(&month)).into_response()
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    session: Session,
    Path((src, id)): Path<(String, String)>,
    Query(month): Query<MonthQuery>,
) -> Response {
    let target = match target(&session, &src, &id).await {
        Ok(t) => t,
        Err(response) => return response,
    };

    match state.repo.delete_reservation(target.id).await {
        Ok(()) => {
            tracing::info!(reservation_id = target.id, "Reservation deleted");
            notify::flash(&session, "Reservation deleted").await;
        }
        Err(e) => return lookup_failed(&session, target.id, e).await,
    }
    Redirect::to(&target.source.back_to(&month)).into_response()
}

/// Month grid of reservations and owner blocks for every room
pub async fn calendar(
    State(state): State<AppState>,
    session: Session,
    Query(month): Query<MonthQuery>,
) -> Response {
    let Some(mut view) = month.view() else {
        notify::error(&session, "Invalid data!").await;
        return Redirect::to("/admin/dashboard").into_response();
    };

    let rooms = match state.repo.all_rooms().await {
        Ok(rooms) => rooms,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list rooms");
            notify::error(&session, AppError::new(ErrorCode::DatabaseError).message).await;
            return Redirect::to("/admin/dashboard").into_response();
        }
    };

    for room in rooms {
        let restrictions = match state
            .repo
            .get_restrictions_for_room_by_date(room.id, view.range())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(room_id = room.id, error = %e, "Failed to load restrictions");
                notify::error(&session, AppError::new(ErrorCode::DatabaseError).message).await;
                return Redirect::to("/admin/dashboard").into_response();
            }
        };
        view.push_room(room, &restrictions);
    }

    // Remembered so the post can tell which blocks were unticked
    CALENDAR_BLOCKS.put(&session, &view.block_ids()).await;

    let data = TemplateData::default().with_calendar(view);
    state.renderer.page(&session, CALENDAR, data).await
}

/// Changes posted from the calendar grid
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BlockChanges {
    /// Block ids to delete
    pub removed: Vec<i32>,
    /// `(room_id, night)` pairs to block
    pub added: Vec<(i32, chrono::NaiveDate)>,
}

impl BlockChanges {
    /// Existing blocks stay while their `remove_block_{room}_{id}` box is
    /// still ticked; every `add_block_{room}_{date}` field adds one.
    pub fn from_form(
        shown: &HashMap<i32, Vec<i32>>,
        fields: &HashMap<String, String>,
    ) -> Self {
        let mut changes = BlockChanges::default();

        for (room_id, ids) in shown {
            for id in ids {
                let key = format!("{REMOVE_BLOCK_PREFIX}{room_id}_{id}");
                if !fields.contains_key(&key) {
                    changes.removed.push(*id);
                }
            }
        }

        for key in fields.keys() {
            let Some(rest) = key.strip_prefix(ADD_BLOCK_PREFIX) else {
                continue;
            };
            let parsed = rest.split_once('_').and_then(|(room, date)| {
                Some((room.parse::<i32>().ok()?, parse_date(date).ok()?))
            });
            match parsed {
                Some(pair) => changes.added.push(pair),
                None => tracing::warn!(field = %key, "Ignoring malformed block field"),
            }
        }

        changes.removed.sort_unstable();
        changes.added.sort_unstable();
        changes
    }
}

pub async fn post_calendar(
    State(state): State<AppState>,
    session: Session,
    FormBody(fields): FormBody<HashMap<String, String>>,
) -> Response {
    let month = MonthQuery {
        y: fields.get("y").cloned(),
        m: fields.get("m").cloned(),
    };
    let shown = CALENDAR_BLOCKS.take(&session).await.unwrap_or_default();
    let changes = BlockChanges::from_form(&shown, &fields);

    let mut failed = false;
    for id in &changes.removed {
        if let Err(e) = state.repo.delete_block_by_id(*id).await {
            tracing::error!(block_id = id, error = %e, "Failed to remove owner block");
            failed = true;
        }
    }
    for (room_id, night) in &changes.added {
        if let Err(e) = state.repo.insert_block_for_room(*room_id, *night).await {
            tracing::error!(room_id, night = %night, error = %e, "Failed to add owner block");
            failed = true;
        }
    }

    tracing::info!(
        removed = changes.removed.len(),
        added = changes.added.len(),
        "Calendar blocks updated"
    );
    if failed {
        notify::error(&session, AppError::new(ErrorCode::DatabaseError).message).await;
    } else {
        notify::flash(&session, "Changes saved").await;
    }
    Redirect::to(&ReviewSource::Calendar.back_to(&month)).into_response()
}
