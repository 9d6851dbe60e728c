//! Shared harness for the HTTP tests
//!
//! Builds the full router over an in-memory repository and drives it with
//! `oneshot`, carrying the session cookie between requests like a browser.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bookings::api::create_router;
use bookings::db::{BookingRepository, MemoryRepo};
use bookings::email::{MailData, MailQueue};
use bookings::error::StoreError;
use bookings::render::Renderer;
use bookings::state::{AppState, MailSettings};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use shared::models::{AccessLevel, DateRange, Reservation, Room, RoomRestriction, User};
use tokio::sync::mpsc;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use tower_sessions::session::Id;

pub const ADMIN_EMAIL: &str = "admin@here.com";
pub const ADMIN_PASSWORD: &str = "password";
pub const GUEST_EMAIL: &str = "guest@here.com";
pub const GUEST_PASSWORD: &str = "letmein";

pub fn crate_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub struct TestClient {
    app: Router,
    pub sessions: MemoryStore,
    cookie: Option<String>,
    token: Option<String>,
    pub repo: Arc<MemoryRepo>,
    pub mail_rx: mpsc::Receiver<MailData>,
}

impl TestClient {
    /// Client over the seeded rooms, with an admin and a guest account
    pub async fn new() -> Self {
        let repo = Arc::new(MemoryRepo::seeded());
        Self::build(repo.clone(), repo, 16).await
    }

    /// Client whose mail queue holds at most `capacity` messages
    pub async fn with_mail_capacity(capacity: usize) -> Self {
        let repo = Arc::new(MemoryRepo::seeded());
        Self::build(repo.clone(), repo, capacity).await
    }

    /// Client whose store fails every restriction insert
    pub async fn with_failing_restrictions() -> Self {
        let repo = Arc::new(MemoryRepo::seeded());
        let failing = Arc::new(FailingRestrictions {
            inner: repo.clone(),
        });
        Self::build(repo, failing, 16).await
    }

    async fn build(
        memory: Arc<MemoryRepo>,
        repo: Arc<dyn BookingRepository>,
        mail_capacity: usize,
    ) -> Self {
        memory
            .add_user("Ada", "Admin", ADMIN_EMAIL, ADMIN_PASSWORD, AccessLevel::Admin)
            .await
            .unwrap();
        memory
            .add_user("Gus", "Guest", GUEST_EMAIL, GUEST_PASSWORD, AccessLevel::Guest)
            .await
            .unwrap();

        let renderer = Renderer::new(crate_dir().join("templates"), true).unwrap();
        let (mail, mail_rx) = MailQueue::new(mail_capacity);
        let state = AppState::new(
            repo,
            renderer,
            mail,
            MailSettings {
                from: "me@here.com".to_string(),
                owner: "owner@here.com".to_string(),
            },
        )
        .with_production(false)
        .with_asset_dir(crate_dir().join("assets"));

        let sessions = MemoryStore::default();
        Self {
            app: create_router(state, sessions.clone()),
            sessions,
            cookie: None,
            token: None,
            repo: memory,
            mail_rx,
        }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            if value.contains("Max-Age=0") {
                self.cookie = None;
                self.token = None;
            } else if let Some(pair) = value.split(';').next() {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let header_str = |name: header::HeaderName| {
            headers.get(name).map(|v| v.to_str().unwrap().to_string())
        };
        let location = header_str(header::LOCATION);
        let content_type = header_str(header::CONTENT_TYPE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        if let Some(token) = extract_meta_token(&body) {
            self.token = Some(token);
        }

        TestResponse {
            status,
            location,
            content_type,
            body,
        }
    }

    /// Id carried by the current session cookie
    pub fn session_id(&self) -> Option<Id> {
        let (_, value) = self.cookie.as_deref()?.split_once('=')?;
        value.parse().ok()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Post a form, adding the session's anti-forgery token
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token().await;
        let mut all = vec![("csrf_token", token.as_str())];
        all.extend_from_slice(fields);
        self.post_raw(uri, &all).await
    }

    /// Post a form exactly as given
    pub async fn post_raw(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
            .unwrap();
        self.send(request).await
    }

    /// Token from the last rendered page, fetching one if needed
    ///
    /// Fetching renders a page, which consumes pending flash messages.
    pub async fn csrf_token(&mut self) -> String {
        if let Some(token) = &self.token {
            return token.clone();
        }
        let page = self.get("/about").await;
        assert_eq!(page.status, StatusCode::OK);
        extract_meta_token(&page.body).expect("page carries a csrf meta tag")
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/user/login", &[("email", email), ("password", password)])
            .await
    }

    /// Search, pick room 1, and land on the booking form
    pub async fn start_booking(&mut self, start: &str, end: &str) {
        let search = self
            .post_form("/search-availability", &[("start", start), ("end", end)])
            .await;
        assert_eq!(search.status, StatusCode::OK);
        let choose = self.get("/choose-room/1").await;
        assert_eq!(choose.location.as_deref(), Some("/make-reservation"));
    }

    pub async fn all_reservations(&self) -> Vec<Reservation> {
        self.repo.all_reservations().await.unwrap()
    }
}

pub fn extract_meta_token(html: &str) -> Option<String> {
    let marker = r#"<meta name="csrf-token" content=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}

pub fn omama(start: &str, end: &str) -> Vec<(&'static str, String)> {
    vec![
        ("start_date", start.to_string()),
        ("end_date", end.to_string()),
        ("first_name", "Omama".to_string()),
        ("last_name", "Olala".to_string()),
        ("email", "omama@getnada.com".to_string()),
        ("phone", "11111111".to_string()),
        ("room_id", "1".to_string()),
    ]
}

pub fn as_pairs<'a>(fields: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Store whose restriction inserts always fail
///
/// Leaves `commit_reservation` to the trait's provided body so the
/// compensating delete is exercised.
pub struct FailingRestrictions {
    pub inner: Arc<MemoryRepo>,
}

#[async_trait]
impl BookingRepository for FailingRestrictions {
    async fn insert_reservation(&self, reservation: &Reservation) -> Result<i32, StoreError> {
        self.inner.insert_reservation(reservation).await
    }

    async fn insert_room_restriction(&self, _: &RoomRestriction) -> Result<i32, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn search_availability_by_dates_by_room_id(
        &self,
        range: DateRange,
        room_id: i32,
    ) -> Result<bool, StoreError> {
        self.inner
            .search_availability_by_dates_by_room_id(range, room_id)
            .await
    }

    async fn search_availability_for_all_rooms(
        &self,
        range: DateRange,
    ) -> Result<Vec<Room>, StoreError> {
        self.inner.search_availability_for_all_rooms(range).await
    }

    async fn get_room_by_id(&self, id: i32) -> Result<Room, StoreError> {
        self.inner.get_room_by_id(id).await
    }

    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.inner.all_rooms().await
    }

    async fn get_user_by_id(&self, id: i32) -> Result<User, StoreError> {
        self.inner.get_user_by_id(id).await
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.update_user(user).await
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(i32, AccessLevel), StoreError> {
        self.inner.authenticate(email, password).await
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.inner.all_reservations().await
    }

    async fn all_new_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.inner.all_new_reservations().await
    }

    async fn get_reservation_by_id(&self, id: i32) -> Result<Reservation, StoreError> {
        self.inner.get_reservation_by_id(id).await
    }

    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.inner.update_reservation(reservation).await
    }

    async fn delete_reservation(&self, id: i32) -> Result<(), StoreError> {
        self.inner.delete_reservation(id).await
    }

    async fn update_processed_for_reservation(
        &self,
        id: i32,
        processed: bool,
    ) -> Result<(), StoreError> {
        self.inner.update_processed_for_reservation(id, processed).await
    }

    async fn get_restrictions_for_room_by_date(
        &self,
        room_id: i32,
        range: DateRange,
    ) -> Result<Vec<RoomRestriction>, StoreError> {
        self.inner
            .get_restrictions_for_room_by_date(room_id, range)
            .await
    }

    async fn insert_block_for_room(&self, room_id: i32, day: NaiveDate) -> Result<(), StoreError> {
        self.inner.insert_block_for_room(room_id, day).await
    }

    async fn delete_block_by_id(&self, id: i32) -> Result<(), StoreError> {
        self.inner.delete_block_by_id(id).await
    }
}
