// Detail-page booking flow:
//
//   Loading -> Ready -> Submitting -> Succeeded
//                 ^          |
//                 +-- Failed <+
//
// Selection changes keep the flow in Ready. A failed submit can be retried by
// the user; nothing is retried automatically.

use crate::api_client::{ApiClient, ApiError};
use crate::availability::{
    compute_bookability, first_bookable, is_bookable, validate_selection, AvailabilitySet,
    BookingSelection, ValidationError,
};
use crate::models::{Guesthouse, GuesthouseId, NewReservation, ReservationId, Review, Room, RoomId};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingState {
    Loading,
    Ready,
    Submitting,
    Succeeded {
        reservation_id: Option<ReservationId>,
    },
    Failed(ApiError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Booking is not ready ({0})")]
    NotReady(&'static str),
}

// Everything fetched for one detail page
#[derive(Debug, Clone, PartialEq)]
pub struct GuesthousePage {
    pub guesthouse: Guesthouse,
    pub rooms: Vec<Room>,
    pub reviews: Vec<Review>,
}

pub struct BookingFlow {
    api: Arc<ApiClient>,
    state: BookingState,
    page: Option<GuesthousePage>,
    availability: Option<AvailabilitySet>,
    selection: BookingSelection,
}

impl BookingFlow {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: BookingState::Loading,
            page: None,
            availability: None,
            selection: BookingSelection::default(),
        }
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn page(&self) -> Option<&GuesthousePage> {
        self.page.as_ref()
    }

    pub fn rooms(&self) -> &[Room] {
        self.page
            .as_ref()
            .map(|p| p.rooms.as_slice())
            .unwrap_or_default()
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn selected_room(&self) -> Option<&Room> {
        self.selection.selected_room.as_ref()
    }

    pub fn bookability(&self) -> HashMap<RoomId, bool> {
        compute_bookability(self.rooms(), self.availability.as_ref())
    }

    pub fn nights(&self) -> i64 {
        self.selection.nights()
    }

    pub fn total_price(&self) -> i64 {
        self.selection.total_price()
    }

    /// Fetches detail, rooms and reviews concurrently.
    ///
    /// Any failed fetch fails the whole load; no partial page is kept. On
    /// success the first bookable room is preselected.
    pub async fn load(
        &mut self,
        guesthouse_id: GuesthouseId,
        availability_hint: Option<AvailabilitySet>,
    ) -> Result<(), ApiError> {
        self.state = BookingState::Loading;
        self.page = None;
        self.selection.selected_room = None;
        debug!(guesthouse_id, "Loading guesthouse page");

        let api = Arc::clone(&self.api);
        let fetched = futures::try_join!(
            api.get_guesthouse_detail(guesthouse_id),
            api.get_guesthouse_rooms(guesthouse_id, availability_hint.as_ref()),
            api.get_reviews(guesthouse_id),
        );

        let (guesthouse, rooms, reviews) = match fetched {
            Ok(parts) => parts,
            Err(e) => {
                warn!(guesthouse_id, error = %e, "Guesthouse page failed to load");
                self.state = BookingState::Failed(e.clone());
                return Err(e);
            }
        };

        self.selection.selected_room =
            first_bookable(&rooms, availability_hint.as_ref()).cloned();
        self.availability = availability_hint;
        self.page = Some(GuesthousePage {
            guesthouse,
            rooms,
            reviews,
        });
        self.state = BookingState::Ready;
        info!(
            guesthouse_id,
            rooms = self.rooms().len(),
            selected = ?self.selection.selected_room.as_ref().map(|r| r.id),
            "Guesthouse page ready"
        );
        Ok(())
    }

    /// Selects a loaded, bookable room. Returns false and changes nothing
    /// otherwise.
    pub fn select_room(&mut self, room: &Room) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        let Some(loaded) = self.rooms().iter().find(|r| r.id == room.id).cloned() else {
            debug!(room_id = room.id, "Ignoring selection of unknown room");
            return false;
        };
        if !is_bookable(loaded.id, self.availability.as_ref()) {
            debug!(room_id = room.id, "Ignoring selection of unavailable room");
            return false;
        }

        self.selection.selected_room = Some(loaded);
        self.state = BookingState::Ready;
        true
    }

    pub fn set_dates(&mut self, check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        self.selection.check_in = check_in;
        self.selection.check_out = check_out;
        self.state = BookingState::Ready;
        true
    }

    pub fn set_guest_count(&mut self, guest_count: u32) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        self.selection.guest_count = guest_count;
        self.state = BookingState::Ready;
        true
    }

    // Back to Ready after a failed submit; a failed load needs `load` again
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, BookingState::Failed(_)) && self.page.is_some() {
            self.state = BookingState::Ready;
            return true;
        }
        false
    }

    /// Validates `selection` and, if it holds, posts exactly one reservation.
    ///
    /// Validation failures return before any network call and leave the state
    /// unchanged.
    pub async fn submit(
        &mut self,
        selection: BookingSelection,
        today: NaiveDate,
    ) -> Result<Option<ReservationId>, BookingError> {
        if !self.accepts_edits() {
            return Err(BookingError::NotReady(self.state_name()));
        }

        // Rules run against the loaded room, never the caller's copy
        let loaded_room = match selection.selected_room.as_ref() {
            Some(requested) => Some(
                self.rooms()
                    .iter()
                    .find(|r| r.id == requested.id)
                    .cloned()
                    .ok_or(ValidationError::RoomUnavailable)?,
            ),
            None => None,
        };
        self.selection = BookingSelection {
            selected_room: loaded_room,
            ..selection
        };
        validate_selection(&self.selection, today)?;

        let (room_id, check_in, check_out) = match (
            self.selection.selected_room.as_ref(),
            self.selection.check_in,
            self.selection.check_out,
        ) {
            (Some(room), Some(check_in), Some(check_out)) => (room.id, check_in, check_out),
            _ => return Err(ValidationError::MissingSelection.into()),
        };
        if !is_bookable(room_id, self.availability.as_ref()) {
            return Err(ValidationError::RoomUnavailable.into());
        }

        let reservation = NewReservation {
            room_id,
            check_in_date: check_in,
            check_out_date: check_out,
            people_count: self.selection.guest_count,
        };

        self.state = BookingState::Submitting;
        info!(room_id, %check_in, %check_out, "Submitting reservation");

        match self.api.create_reservation(&reservation).await {
            Ok(reservation_id) => {
                info!(?reservation_id, "Reservation created");
                self.state = BookingState::Succeeded { reservation_id };
                Ok(reservation_id)
            }
            Err(e) => {
                warn!(room_id, error = %e, "Reservation failed");
                self.state = BookingState::Failed(e.clone());
                Err(e.into())
            }
        }
    }

    // Submits whatever is currently selected
    pub async fn submit_current(
        &mut self,
        today: NaiveDate,
    ) -> Result<Option<ReservationId>, BookingError> {
        let selection = self.selection.clone();
        self.submit(selection, today).await
    }

    fn accepts_edits(&self) -> bool {
        self.page.is_some()
            && matches!(self.state, BookingState::Ready | BookingState::Failed(_))
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            BookingState::Loading => "loading",
            BookingState::Ready => "ready",
            BookingState::Submitting => "submitting",
            BookingState::Succeeded { .. } => "succeeded",
            BookingState::Failed(_) => "failed",
        }
    }
}
