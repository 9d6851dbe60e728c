//! Login and the administrator area

mod common;

use axum::http::StatusCode;
use bookings::db::BookingRepository;
use common::{
    ADMIN_EMAIL, ADMIN_PASSWORD, GUEST_EMAIL, GUEST_PASSWORD, TestClient, as_pairs, d, omama,
};
use shared::models::RestrictionKind;

async fn booked_client() -> TestClient {
    let mut client = TestClient::new().await;
    let fields = omama("2050-01-10", "2050-01-12");
    let posted = client.post_form("/make-reservation", &as_pairs(&fields)).await;
    assert_eq!(posted.location.as_deref(), Some("/reservation-summary"));
    client
}

async fn admin_client() -> TestClient {
    let mut client = booked_client().await;
    let login = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(login.location.as_deref(), Some("/"));
    client
}

#[tokio::test]
async fn test_admin_area_requires_login() {
    let mut client = TestClient::new().await;
    for path in [
        "/admin/dashboard",
        "/admin/reservations-new",
        "/admin/reservations-all",
        "/admin/reservations-calendar",
        "/admin/reservations/all/1/show",
    ] {
        let response = client.get(path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.location.as_deref(), Some("/user/login"), "{path}");
    }
    let login = client.get("/user/login").await;
    assert!(login.body.contains("Log in first!"));
}

#[tokio::test]
async fn test_guest_account_is_not_admin() {
    let mut client = TestClient::new().await;
    let login = client.login(GUEST_EMAIL, GUEST_PASSWORD).await;
    assert_eq!(login.location.as_deref(), Some("/"));

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.location.as_deref(), Some("/user/login"));
}

#[tokio::test]
async fn test_login_success() {
    let mut client = TestClient::new().await;
    let login = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
    assert_eq!(login.location.as_deref(), Some("/"));

    let home = client.get("/").await;
    assert!(home.body.contains("Logged in successfully"));
    assert!(home.body.contains(r#"href="/user/logout""#));

    let dashboard = client.get("/admin/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let mut client = TestClient::new().await;
    let login = client.login(ADMIN_EMAIL, "wrong").await;
    assert_eq!(login.location.as_deref(), Some("/user/login"));
    assert!(client.get("/user/login").await.body.contains("Invalid login credentials"));

    let login = client.login("nobody@here.com", ADMIN_PASSWORD).await;
    assert_eq!(login.location.as_deref(), Some("/user/login"));
    assert_eq!(client.get("/admin/dashboard").await.location.as_deref(), Some("/user/login"));
}

#[tokio::test]
async fn test_login_form_validation() {
    let mut client = TestClient::new().await;
    let page = client.login("", "").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("This field cannot be blank"));

    let page = client.login("not-an-email", "secret").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Invalid email address"));
    assert!(page.body.contains(r#"value="not-an-email""#));
    assert!(!page.body.contains("secret"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let mut client = admin_client().await;
    let logout = client.get("/user/logout").await;
    assert_eq!(logout.location.as_deref(), Some("/user/login"));

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.location.as_deref(), Some("/user/login"));
}

#[tokio::test]
async fn test_reservation_lists() {
    let mut client = admin_client().await;

    let new = client.get("/admin/reservations-new").await;
    assert_eq!(new.status, StatusCode::OK);
    assert!(new.body.contains("/admin/reservations/new/1/show"));
    assert!(new.body.contains("Olala"));

    let all = client.get("/admin/reservations-all").await;
    assert!(all.body.contains("/admin/reservations/all/1/show"));
    assert!(all.body.contains("2050-01-10"));
}

#[tokio::test]
async fn test_process_reservation() {
    let mut client = admin_client().await;

    let response = client.get("/admin/process-reservation/new/1/do").await;
    assert_eq!(response.location.as_deref(), Some("/admin/reservations-new"));

    let new = client.get("/admin/reservations-new").await;
    assert!(new.body.contains("Reservation marked as processed"));
    assert!(!new.body.contains("Olala"));

    let stored = client.repo.get_reservation_by_id(1).await.unwrap();
    assert!(stored.processed);
}

#[tokio::test]
async fn test_process_from_calendar_keeps_month() {
    let mut client = admin_client().await;
    let response = client
        .get("/admin/process-reservation/cal/1/do?y=2050&m=1")
        .await;
    assert_eq!(
        response.location.as_deref(),
        Some("/admin/reservations-calendar?y=2050&m=1")
    );
}

#[tokio::test]
async fn test_show_and_update_reservation() {
    let mut client = admin_client().await;

    let show = client.get("/admin/reservations/all/1/show").await;
    assert_eq!(show.status, StatusCode::OK);
    assert!(show.body.contains(r#"value="Omama""#));
    assert!(show.body.contains("10 January 2050"));

    let mut fields = omama("2050-01-10", "2050-01-12");
    fields[2].1 = "Omar".to_string();
    fields[5].1 = "22222222".to_string();
    let posted = client
        .post_form("/admin/reservations/all/1", &as_pairs(&fields))
        .await;
    assert_eq!(posted.location.as_deref(), Some("/admin/reservations-all"));

    let stored = client.repo.get_reservation_by_id(1).await.unwrap();
    assert_eq!(stored.first_name, "Omar");
    assert_eq!(stored.phone, "22222222");
    // Dates are not editable here
    assert_eq!(stored.start_date, d(2050, 1, 10));
}

#[tokio::test]
async fn test_update_with_invalid_fields() {
    let mut client = admin_client().await;
    let mut fields = omama("2050-01-10", "2050-01-12");
    fields[2].1 = "Om".to_string();
    let page = client
        .post_form("/admin/reservations/new/1", &as_pairs(&fields))
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("This field must be at least 3 characters long"));

    let stored = client.repo.get_reservation_by_id(1).await.unwrap();
    assert_eq!(stored.first_name, "Omama");
}

#[tokio::test]
async fn test_unknown_reservation() {
    let mut client = admin_client().await;
    let response = client.get("/admin/reservations/all/99/show").await;
    assert_eq!(response.location.as_deref(), Some("/admin/dashboard"));
    assert!(client.get("/admin/dashboard").await.body.contains("Reservation not found"));

    let response = client.get("/admin/reservations/elsewhere/1/show").await;
    assert_eq!(response.location.as_deref(), Some("/admin/dashboard"));
}

#[tokio::test]
async fn test_delete_reservation_frees_room() {
    let mut client = admin_client().await;
    let response = client.get("/admin/delete-reservation/all/1/do").await;
    assert_eq!(response.location.as_deref(), Some("/admin/reservations-all"));

    assert!(client.all_reservations().await.is_empty());
    assert!(client.repo.restrictions().await.is_empty());
}

#[tokio::test]
async fn test_calendar_shows_month() {
    let mut client = admin_client().await;
    client.repo.insert_block_for_room(2, d(2050, 1, 20)).await.unwrap();

    let page = client.get("/admin/reservations-calendar?y=2050&m=1").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("January 2050"));
    assert!(page.body.contains("/admin/reservations/cal/1/show"));
    assert!(page.body.contains(r#"name="add_block_1_2050-01-20""#));
    assert!(page.body.contains(r#"name="remove_block_2_2""#));
    assert!(page.body.contains("y=2049&m=12"));

    // Out of range months fall back to the current one
    let page = client.get("/admin/reservations-calendar?y=2050&m=13").await;
    assert_eq!(page.status, StatusCode::OK);
}

#[tokio::test]
async fn test_calendar_adds_and_removes_blocks() {
    let mut client = admin_client().await;
    client.get("/admin/reservations-calendar?y=2050&m=1").await;

    let posted = client
        .post_form(
            "/admin/reservations-calendar",
            &[("y", "2050"), ("m", "1"), ("add_block_1_2050-01-20", "1")],
        )
        .await;
    assert_eq!(
        posted.location.as_deref(),
        Some("/admin/reservations-calendar?y=2050&m=1")
    );

    let blocks: Vec<_> = client
        .repo
        .restrictions()
        .await
        .into_iter()
        .filter(|r| r.kind == RestrictionKind::OwnerBlock)
        .collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!((blocks[0].room_id, blocks[0].start_date), (1, d(2050, 1, 20)));
    assert_eq!(blocks[0].end_date, d(2050, 1, 21));
    let block_id = blocks[0].id;

    // Shown ticked; posting without the box removes it
    let page = client.get("/admin/reservations-calendar?y=2050&m=1").await;
    assert!(page.body.contains(&format!(r#"name="remove_block_1_{block_id}""#)));
    assert!(page.body.contains("Changes saved"));

    client
        .post_form("/admin/reservations-calendar", &[("y", "2050"), ("m", "1")])
        .await;
    let remaining = client.repo.restrictions().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].kind, RestrictionKind::Reservation);
}

#[tokio::test]
async fn test_calendar_keeps_ticked_blocks() {
    let mut client = admin_client().await;
    client.repo.insert_block_for_room(1, d(2050, 1, 5)).await.unwrap();
    client.get("/admin/reservations-calendar?y=2050&m=1").await;

    client
        .post_form(
            "/admin/reservations-calendar",
            &[("y", "2050"), ("m", "1"), ("remove_block_1_2", "2")],
        )
        .await;
    assert_eq!(client.repo.restrictions().await.len(), 2);
}
