//! In-process store
//!
//! Keeps everything behind one async mutex, so each operation (including
//! `commit_reservation`) is atomic. Used by the test suites and for running
//! the site without a database.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use shared::models::{
    AccessLevel, DateRange, Reservation, RestrictionKind, Room, RoomRestriction, User,
};
use tokio::sync::Mutex;

use super::BookingRepository;
use crate::error::StoreError;
use crate::util::{hash_password, verify_password};

#[derive(Default)]
struct MemoryState {
    rooms: Vec<Room>,
    users: Vec<User>,
    reservations: Vec<Reservation>,
    restrictions: Vec<RoomRestriction>,
    next_user_id: i32,
    next_reservation_id: i32,
    next_restriction_id: i32,
}

impl MemoryState {
    fn room(&self, id: i32) -> Result<&Room, StoreError> {
        self.rooms
            .iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound("room"))
    }

    fn is_available(&self, room_id: i32, range: &DateRange) -> bool {
        !self
            .restrictions
            .iter()
            .any(|r| r.room_id == room_id && r.range().overlaps(range))
    }

    fn insert_reservation(&mut self, reservation: &Reservation) -> Result<i32, StoreError> {
        let room = self.room(reservation.room_id)?.clone();
        self.next_reservation_id += 1;
        let now = Utc::now();
        let stored = Reservation {
            id: self.next_reservation_id,
            room,
            processed: false,
            created_at: now,
            updated_at: now,
            ..reservation.clone()
        };
        self.reservations.push(stored);
        Ok(self.next_reservation_id)
    }

    fn insert_restriction(&mut self, restriction: &RoomRestriction) -> Result<i32, StoreError> {
        self.room(restriction.room_id)?;
        self.next_restriction_id += 1;
        let now = Utc::now();
        self.restrictions.push(RoomRestriction {
            id: self.next_restriction_id,
            created_at: now,
            updated_at: now,
            ..restriction.clone()
        });
        Ok(self.next_restriction_id)
    }

    fn reservation_mut(&mut self, id: i32) -> Result<&mut Reservation, StoreError> {
        self.reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound("reservation"))
    }

    fn sorted(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
        reservations.sort_by_key(|r| (r.start_date, r.id));
        reservations
    }
}

#[derive(Default)]
pub struct MemoryRepo {
    state: Mutex<MemoryState>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the given rooms
    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rooms,
                ..Default::default()
            }),
        }
    }

    /// Store holding the two rooms the site offers
    pub fn seeded() -> Self {
        Self::with_rooms(vec![
            Room::new(1, "General's Quarters"),
            Room::new(2, "Major's Suite"),
        ])
    }

    /// Create a user account, returning its id
    pub async fn add_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        access_level: AccessLevel,
    ) -> Result<i32, StoreError> {
        let hash = hash_password(password)?;
        let mut state = self.state.lock().await;
        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_user_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: hash,
            access_level,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user);
        Ok(state.next_user_id)
    }

    /// Snapshot of every stored restriction
    pub async fn restrictions(&self) -> Vec<RoomRestriction> {
        self.state.lock().await.restrictions.clone()
    }
}

#[async_trait]
impl BookingRepository for MemoryRepo {
    async fn insert_reservation(&self, reservation: &Reservation) -> Result<i32, StoreError> {
        self.state.lock().await.insert_reservation(reservation)
    }

    async fn insert_room_restriction(
        &self,
        restriction: &RoomRestriction,
    ) -> Result<i32, StoreError> {
        self.state.lock().await.insert_restriction(restriction)
    }

    async fn search_availability_by_dates_by_room_id(
        &self,
        range: DateRange,
        room_id: i32,
    ) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.is_available(room_id, &range))
    }

    async fn search_availability_for_all_rooms(
        &self,
        range: DateRange,
    ) -> Result<Vec<Room>, StoreError> {
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .iter()
            .filter(|room| state.is_available(room.id, &range))
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn get_room_by_id(&self, id: i32) -> Result<Room, StoreError> {
        self.state.lock().await.room(id).cloned()
    }

    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms = self.state.lock().await.rooms.clone();
        rooms.sort_by(|a, b| a.room_name.cmp(&b.room_name));
        Ok(rooms)
    }

    async fn get_user_by_id(&self, id: i32) -> Result<User, StoreError> {
        self.state
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound("user"))?;
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.email = user.email.clone();
        stored.access_level = user.access_level;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(i32, AccessLevel), StoreError> {
        let state = self.state.lock().await;
        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .ok_or(StoreError::InvalidCredentials)?;
        if !verify_password(password, &user.password) {
            return Err(StoreError::InvalidCredentials);
        }
        Ok((user.id, user.access_level))
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        let state = self.state.lock().await;
        Ok(MemoryState::sorted(state.reservations.clone()))
    }

    async fn all_new_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        let state = self.state.lock().await;
        let fresh = state
            .reservations
            .iter()
            .filter(|r| !r.processed)
            .cloned()
            .collect();
        Ok(MemoryState::sorted(fresh))
    }

    async fn get_reservation_by_id(&self, id: i32) -> Result<Reservation, StoreError> {
        self.state
            .lock()
            .await
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("reservation"))
    }

    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let stored = state.reservation_mut(reservation.id)?;
        stored.first_name = reservation.first_name.clone();
        stored.last_name = reservation.last_name.clone();
        stored.email = reservation.email.clone();
        stored.phone = reservation.phone.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_reservation(&self, id: i32) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let before = state.reservations.len();
        state.reservations.retain(|r| r.id != id);
        if state.reservations.len() == before {
            return Err(StoreError::NotFound("reservation"));
        }
        state.restrictions.retain(|r| r.reservation_id != Some(id));
        Ok(())
    }

    async fn update_processed_for_reservation(
        &self,
        id: i32,
        processed: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let stored = state.reservation_mut(id)?;
        stored.processed = processed;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn get_restrictions_for_room_by_date(
        &self,
        room_id: i32,
        range: DateRange,
    ) -> Result<Vec<RoomRestriction>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .restrictions
            .iter()
            .filter(|r| r.room_id == room_id && r.range().overlaps(&range))
            .cloned()
            .collect())
    }

    async fn insert_block_for_room(&self, room_id: i32, day: NaiveDate) -> Result<(), StoreError> {
        let night = DateRange::single_night(day).ok_or(StoreError::NotFound("date"))?;
        let block = RoomRestriction::new(room_id, night, RestrictionKind::OwnerBlock, None);
        self.state.lock().await.insert_restriction(&block)?;
        Ok(())
    }

    async fn delete_block_by_id(&self, id: i32) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let before = state.restrictions.len();
        state
            .restrictions
            .retain(|r| !(r.id == id && r.kind == RestrictionKind::OwnerBlock));
        if state.restrictions.len() == before {
            return Err(StoreError::NotFound("block"));
        }
        Ok(())
    }

    async fn commit_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        let mut state = self.state.lock().await;
        let range = reservation.range();
        state.room(reservation.room_id)?;
        if !state.is_available(reservation.room_id, &range) {
            return Err(StoreError::Unavailable {
                room_id: reservation.room_id,
                start: range.start,
                end: range.end,
            });
        }

        let id = state.insert_reservation(reservation)?;
        let restriction =
            RoomRestriction::new(reservation.room_id, range, RestrictionKind::Reservation, Some(id));
        state.insert_restriction(&restriction)?;

        state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("reservation"))
    }
}
