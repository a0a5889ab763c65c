// Host dashboard: guesthouse drafts and per-guesthouse reservation lists.

use crate::api_client::{ApiClient, ApiError};
use crate::models::{
    GuesthouseId, GuesthousePatch, HostReservation, HostedGuesthouse, NewGuesthouse, NewRoom,
};
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Reverse;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuesthouseDraftError {
    #[error("Guesthouse name is required")]
    MissingName,

    #[error("Add at least one room")]
    NoRooms,

    #[error("Room {index} needs a name")]
    RoomWithoutName { index: usize },

    #[error("Room {index} must hold at least one guest")]
    RoomWithoutCapacity { index: usize },

    #[error("Room {index} cannot have a negative price")]
    NegativePrice { index: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDraft {
    pub name: String,
    pub capacity: u32,
    pub price: i64,
}

impl Default for RoomDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: 2,
            price: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuesthouseDraft {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone_number: String,
    pub rating: f64,
    pub photo_id: i64,
    pub rooms: Vec<RoomDraft>,
}

impl Default for GuesthouseDraft {
    // A new form starts with one room
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            address: String::new(),
            phone_number: String::new(),
            rating: 0.0,
            photo_id: 0,
            rooms: vec![RoomDraft::default()],
        }
    }
}

impl GuesthouseDraft {
    /// Checks the draft and builds the creation payload. Room indexes in
    /// errors are zero-based.
    pub fn validate(&self) -> Result<NewGuesthouse, GuesthouseDraftError> {
        if self.name.trim().is_empty() {
            return Err(GuesthouseDraftError::MissingName);
        }
        if self.rooms.is_empty() {
            return Err(GuesthouseDraftError::NoRooms);
        }

        let mut rooms = Vec::with_capacity(self.rooms.len());
        for (index, room) in self.rooms.iter().enumerate() {
            if room.name.trim().is_empty() {
                return Err(GuesthouseDraftError::RoomWithoutName { index });
            }
            if room.capacity == 0 {
                return Err(GuesthouseDraftError::RoomWithoutCapacity { index });
            }
            if room.price < 0 {
                return Err(GuesthouseDraftError::NegativePrice { index });
            }
            rooms.push(NewRoom {
                name: room.name.trim().to_string(),
                capacity: room.capacity,
                price: room.price,
            });
        }

        Ok(NewGuesthouse {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            address: self.address.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            rating: self.rating,
            photo_id: self.photo_id,
            room_count: rooms.len(),
            rooms,
        })
    }

    // Only name, description and phone number are editable after creation
    pub fn to_patch(&self) -> Result<GuesthousePatch, GuesthouseDraftError> {
        if self.name.trim().is_empty() {
            return Err(GuesthouseDraftError::MissingName);
        }
        Ok(GuesthousePatch {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            phone_number: self.phone_number.trim().to_string(),
        })
    }
}

pub async fn my_guesthouses(api: &ApiClient) -> Result<Vec<HostedGuesthouse>, ApiError> {
    api.my_guesthouses().await
}

pub async fn create_guesthouse(
    api: &ApiClient,
    draft: &GuesthouseDraft,
) -> Result<Value, GuesthouseDraftError> {
    let payload = draft.validate()?;
    let created = api.create_guesthouse(&payload).await?;
    info!(name = %payload.name, rooms = payload.room_count, "Guesthouse created");
    Ok(created)
}

pub async fn update_guesthouse(
    api: &ApiClient,
    id: GuesthouseId,
    draft: &GuesthouseDraft,
) -> Result<(), GuesthouseDraftError> {
    let patch = draft.to_patch()?;
    api.update_guesthouse(id, &patch).await?;
    info!(guesthouse_id = id, "Guesthouse updated");
    Ok(())
}

pub async fn delete_guesthouse(api: &ApiClient, id: GuesthouseId) -> Result<(), ApiError> {
    api.delete_guesthouse(id).await?;
    info!(guesthouse_id = id, "Guesthouse deleted");
    Ok(())
}

pub async fn guesthouse_reservations(
    api: &ApiClient,
    id: GuesthouseId,
) -> Result<Vec<HostReservation>, ApiError> {
    api.guesthouse_reservations(id).await
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationSplit {
    // Not yet checked out, soonest check-in first
    pub upcoming: Vec<HostReservation>,
    // Checked out, most recent first
    pub past: Vec<HostReservation>,
}

pub fn partition_reservations(rows: Vec<HostReservation>, today: NaiveDate) -> ReservationSplit {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|r| r.check_out_date >= today);
    upcoming.sort_by_key(|r| r.check_in_date);
    past.sort_by_key(|r| Reverse(r.check_out_date));
    ReservationSplit { upcoming, past }
}
