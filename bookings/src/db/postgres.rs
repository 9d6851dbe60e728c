//! PostgreSQL store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{
    AccessLevel, DateRange, Reservation, RestrictionKind, Room, RoomRestriction, User,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::BookingRepository;
use crate::config::Config;
use crate::error::{ConfigError, StoreError};
use crate::util::verify_password;

/// SQLSTATE reported when a SERIALIZABLE transaction loses a conflict
const SERIALIZATION_FAILURE: &str = "40001";

/// Connect and bring the schema up to date
pub async fn connect(config: &Config) -> Result<PgPool, ConfigError> {
    let pool = PgPool::connect_with(config.pg_connect_options()?).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    room_id: i32,
    processed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    room_name: String,
    room_created_at: DateTime<Utc>,
    room_updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            start_date: row.start_date,
            end_date: row.end_date,
            room_id: row.room_id,
            room: Room {
                id: row.room_id,
                room_name: row.room_name,
                created_at: row.room_created_at,
                updated_at: row.room_updated_at,
            },
            processed: row.processed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const RESERVATION_SELECT: &str = r#"
    SELECT r.id, r.first_name, r.last_name, r.email, r.phone,
           r.start_date, r.end_date, r.room_id, r.processed,
           r.created_at, r.updated_at,
           rm.room_name, rm.created_at AS room_created_at, rm.updated_at AS room_updated_at
    FROM reservations r
    JOIN rooms rm ON rm.id = r.room_id
"#;

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_transaction_serializable(
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<(), StoreError> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn list_reservations(&self, only_new: bool) -> Result<Vec<Reservation>, StoreError> {
        let filter = if only_new { "WHERE r.processed = false" } else { "" };
        let sql = format!("{RESERVATION_SELECT} {filter} ORDER BY r.start_date ASC, r.id ASC");
        let rows: Vec<ReservationRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    /// Re-checks availability and writes both rows in one SERIALIZABLE
    /// transaction, so two bookings racing for the same nights cannot both
    /// commit.
    async fn commit_in_transaction(&self, reservation: &Reservation) -> Result<i32, StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::set_transaction_serializable(&mut tx).await?;

        let overlapping: i64 = sqlx::query_scalar(
            "SELECT count(id) FROM room_restrictions \
             WHERE room_id = $1 AND $2 < end_date AND $3 > start_date",
        )
        .bind(reservation.room_id)
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .fetch_one(&mut *tx)
        .await?;
        if overlapping > 0 {
            return Err(unavailable(reservation));
        }

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO reservations (first_name, last_name, email, phone, start_date, end_date, room_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&reservation.first_name)
        .bind(&reservation.last_name)
        .bind(&reservation.email)
        .bind(&reservation.phone)
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.room_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO room_restrictions (start_date, end_date, room_id, reservation_id, restriction_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.room_id)
        .bind(id)
        .bind(RestrictionKind::Reservation)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }
}

fn is_serialization_failure(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == SERIALIZATION_FAILURE)
}

fn unavailable(reservation: &Reservation) -> StoreError {
    StoreError::Unavailable {
        room_id: reservation.room_id,
        start: reservation.start_date,
        end: reservation.end_date,
    }
}

fn not_found_if_untouched(rows: u64, what: &'static str) -> Result<(), StoreError> {
    if rows == 0 {
        return Err(StoreError::NotFound(what));
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for PgRepository {
    async fn insert_reservation(&self, reservation: &Reservation) -> Result<i32, StoreError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO reservations (first_name, last_name, email, phone, start_date, end_date, room_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&reservation.first_name)
        .bind(&reservation.last_name)
        .bind(&reservation.email)
        .bind(&reservation.phone)
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.room_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_room_restriction(
        &self,
        restriction: &RoomRestriction,
    ) -> Result<i32, StoreError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO room_restrictions (start_date, end_date, room_id, reservation_id, restriction_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(restriction.start_date)
        .bind(restriction.end_date)
        .bind(restriction.room_id)
        .bind(restriction.reservation_id)
        .bind(restriction.kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn search_availability_by_dates_by_room_id(
        &self,
        range: DateRange,
        room_id: i32,
    ) -> Result<bool, StoreError> {
        let overlapping: i64 = sqlx::query_scalar(
            "SELECT count(id) FROM room_restrictions \
             WHERE room_id = $1 AND $2 < end_date AND $3 > start_date",
        )
        .bind(room_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(overlapping == 0)
    }

    async fn search_availability_for_all_rooms(
        &self,
        range: DateRange,
    ) -> Result<Vec<Room>, StoreError> {
        let rooms: Vec<Room> = sqlx::query_as(
            "SELECT r.id, r.room_name, r.created_at, r.updated_at FROM rooms r \
             WHERE r.id NOT IN ( \
                 SELECT rr.room_id FROM room_restrictions rr \
                 WHERE $1 < rr.end_date AND $2 > rr.start_date) \
             ORDER BY r.id",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    async fn get_room_by_id(&self, id: i32) -> Result<Room, StoreError> {
        sqlx::query_as("SELECT id, room_name, created_at, updated_at FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("room"))
    }

    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let rooms: Vec<Room> = sqlx::query_as(
            "SELECT id, room_name, created_at, updated_at FROM rooms ORDER BY room_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    async fn get_user_by_id(&self, id: i32) -> Result<User, StoreError> {
        sqlx::query_as(
            "SELECT id, first_name, last_name, email, password, access_level, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("user"))
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, email = $3, access_level = $4, \
             updated_at = now() WHERE id = $5",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.access_level)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        not_found_if_untouched(result.rows_affected(), "user")
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(i32, AccessLevel), StoreError> {
        let row: Option<(i32, String, AccessLevel)> =
            sqlx::query_as("SELECT id, password, access_level FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        let (id, hash, level) = row.ok_or(StoreError::InvalidCredentials)?;
        if !verify_password(password, &hash) {
            return Err(StoreError::InvalidCredentials);
        }
        Ok((id, level))
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.list_reservations(false).await
    }

    async fn all_new_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.list_reservations(true).await
    }

    async fn get_reservation_by_id(&self, id: i32) -> Result<Reservation, StoreError> {
        let sql = format!("{RESERVATION_SELECT} WHERE r.id = $1");
        let row: Option<ReservationRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Reservation::from)
            .ok_or(StoreError::NotFound("reservation"))
    }

    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE reservations SET first_name = $1, last_name = $2, email = $3, phone = $4, \
             updated_at = now() WHERE id = $5",
        )
        .bind(&reservation.first_name)
        .bind(&reservation.last_name)
        .bind(&reservation.email)
        .bind(&reservation.phone)
        .bind(reservation.id)
        .execute(&self.pool)
        .await?;
        not_found_if_untouched(result.rows_affected(), "reservation")
    }

    async fn delete_reservation(&self, id: i32) -> Result<(), StoreError> {
        // room_restrictions.reservation_id cascades
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        not_found_if_untouched(result.rows_affected(), "reservation")
    }

    async fn update_processed_for_reservation(
        &self,
        id: i32,
        processed: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE reservations SET processed = $1, updated_at = now() WHERE id = $2",
        )
        .bind(processed)
        .bind(id)
        .execute(&self.pool)
        .await?;
        not_found_if_untouched(result.rows_affected(), "reservation")
    }

    async fn get_restrictions_for_room_by_date(
        &self,
        room_id: i32,
        range: DateRange,
    ) -> Result<Vec<RoomRestriction>, StoreError> {
        let restrictions: Vec<RoomRestriction> = sqlx::query_as(
            "SELECT id, start_date, end_date, room_id, reservation_id, restriction_id, \
             created_at, updated_at FROM room_restrictions \
             WHERE room_id = $1 AND $2 < end_date AND $3 > start_date \
             ORDER BY start_date",
        )
        .bind(room_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(restrictions)
    }

    async fn insert_block_for_room(&self, room_id: i32, day: NaiveDate) -> Result<(), StoreError> {
        let night = DateRange::single_night(day).ok_or(StoreError::NotFound("date"))?;
        let block = RoomRestriction::new(room_id, night, RestrictionKind::OwnerBlock, None);
        self.insert_room_restriction(&block).await?;
        Ok(())
    }

    async fn delete_block_by_id(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM room_restrictions WHERE id = $1 AND restriction_id = $2")
            .bind(id)
            .bind(RestrictionKind::OwnerBlock)
            .execute(&self.pool)
            .await?;
        not_found_if_untouched(result.rows_affected(), "block")
    }

    async fn commit_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        let id = match self.commit_in_transaction(reservation).await {
            Err(StoreError::Database(e)) if is_serialization_failure(&e) => {
                tracing::info!(room_id = reservation.room_id, "Lost booking race");
                return Err(unavailable(reservation));
            }
            result => result?,
        };
        self.get_reservation_by_id(id).await
    }
}
