//! Availability store
//!
//! [`BookingRepository`] is the only door to durable state: rooms, users,
//! reservations and the room restrictions that make a room unavailable.
//!
//! Stays are half-open date ranges: a restriction on `[start, end)` blocks
//! the nights `start..end`, so a new stay may begin on another stay's
//! departure day. Both availability queries use the same predicate
//! (`start < other.end && end > other.start`).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    AccessLevel, DateRange, Reservation, RestrictionKind, Room, RoomRestriction, User,
};

use crate::error::StoreError;

pub use memory::MemoryRepo;
pub use postgres::PgRepository;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a reservation, returning its id
    async fn insert_reservation(&self, reservation: &Reservation) -> Result<i32, StoreError>;

    /// Insert a room restriction, returning its id
    async fn insert_room_restriction(&self, restriction: &RoomRestriction)
    -> Result<i32, StoreError>;

    /// True when no restriction on the room overlaps the range
    async fn search_availability_by_dates_by_room_id(
        &self,
        range: DateRange,
        room_id: i32,
    ) -> Result<bool, StoreError>;

    /// Rooms without any restriction overlapping the range, ordered by id
    async fn search_availability_for_all_rooms(
        &self,
        range: DateRange,
    ) -> Result<Vec<Room>, StoreError>;

    async fn get_room_by_id(&self, id: i32) -> Result<Room, StoreError>;

    /// All rooms, ordered by name
    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError>;

    async fn get_user_by_id(&self, id: i32) -> Result<User, StoreError>;

    /// Update a user's name, e-mail and access level
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    /// Check credentials, returning the user id and access level
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(i32, AccessLevel), StoreError>;

    /// Every reservation, by arrival date
    async fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    /// Reservations not yet processed, by arrival date
    async fn all_new_reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    async fn get_reservation_by_id(&self, id: i32) -> Result<Reservation, StoreError>;

    /// Update the guest fields of a reservation
    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Delete a reservation together with its restriction
    async fn delete_reservation(&self, id: i32) -> Result<(), StoreError>;

    async fn update_processed_for_reservation(
        &self,
        id: i32,
        processed: bool,
    ) -> Result<(), StoreError>;

    /// Restrictions on a room overlapping the range
    async fn get_restrictions_for_room_by_date(
        &self,
        room_id: i32,
        range: DateRange,
    ) -> Result<Vec<RoomRestriction>, StoreError>;

    /// Block a single night for the owner
    async fn insert_block_for_room(&self, room_id: i32, day: NaiveDate) -> Result<(), StoreError>;

    /// Remove an owner block
    async fn delete_block_by_id(&self, id: i32) -> Result<(), StoreError>;

    /// Store a reservation and its restriction as one unit
    ///
    /// Returns the reservation with its new id. The provided body inserts the
    /// reservation, then the restriction, and deletes the reservation again
    /// when the restriction cannot be stored. Stores with transactions
    /// override it.
    async fn commit_reservation(&self, reservation: &Reservation) -> Result<Reservation, StoreError> {
        let id = self.insert_reservation(reservation).await?;

        let restriction = RoomRestriction::new(
            reservation.room_id,
            reservation.range(),
            RestrictionKind::Reservation,
            Some(id),
        );
        if let Err(e) = self.insert_room_restriction(&restriction).await {
            if let Err(cleanup) = self.delete_reservation(id).await {
                tracing::error!(
                    reservation_id = id,
                    error = %cleanup,
                    "Failed to remove reservation after restriction insert failed"
                );
            }
            return Err(e);
        }

        let mut committed = reservation.clone();
        committed.id = id;
        Ok(committed)
    }
}
