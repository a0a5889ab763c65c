// Bookability, selection validation and pricing. Everything here is pure.

use crate::models::{Room, RoomId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

// Room ids the server reports as bookable for the requested dates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilitySet(BTreeSet<RoomId>);

impl AvailabilitySet {
    pub fn from_ids(ids: impl IntoIterator<Item = RoomId>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: RoomId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.0.iter().copied()
    }

    // Comma-joined ids, ascending, as sent in `room_available`
    pub fn to_query_value(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<RoomId> for AvailabilitySet {
    fn from_iter<I: IntoIterator<Item = RoomId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select a room, dates and number of guests")]
    MissingSelection,

    #[error("Too many guests for the selected room")]
    CapacityExceeded,

    #[error("Check-in cannot be in the past")]
    PastDate,

    #[error("Check-out must be after check-in")]
    InvertedRange,

    #[error("The selected room is not available for these dates")]
    RoomUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSelection {
    pub selected_room: Option<Room>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guest_count: u32,
}

impl BookingSelection {
    pub fn nights(&self) -> i64 {
        nights(self.check_in, self.check_out)
    }

    // Price of the current selection; 0 without a room or a valid range
    pub fn total_price(&self) -> i64 {
        self.selected_room
            .as_ref()
            .map_or(0, |room| total_price(room, self.nights()))
    }
}

/// A room is bookable when no availability set was supplied or the set
/// contains its id.
pub fn is_bookable(room_id: RoomId, availability: Option<&AvailabilitySet>) -> bool {
    availability.map_or(true, |set| set.contains(room_id))
}

pub fn compute_bookability(
    rooms: &[Room],
    availability: Option<&AvailabilitySet>,
) -> HashMap<RoomId, bool> {
    rooms
        .iter()
        .map(|room| (room.id, is_bookable(room.id, availability)))
        .collect()
}

pub fn first_bookable<'a>(
    rooms: &'a [Room],
    availability: Option<&AvailabilitySet>,
) -> Option<&'a Room> {
    rooms.iter().find(|room| is_bookable(room.id, availability))
}

/// Checks a selection and reports the first rule it breaks.
///
/// Order: room and dates present, guest count within capacity, check-in not
/// before `today`, check-in strictly before check-out. A guest count of zero
/// counts as an incomplete selection.
pub fn validate_selection(
    selection: &BookingSelection,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    let room = selection
        .selected_room
        .as_ref()
        .ok_or(ValidationError::MissingSelection)?;
    let (check_in, check_out) = match (selection.check_in, selection.check_out) {
        (Some(check_in), Some(check_out)) => (check_in, check_out),
        _ => return Err(ValidationError::MissingSelection),
    };
    if selection.guest_count == 0 {
        return Err(ValidationError::MissingSelection);
    }

    if selection.guest_count > room.capacity {
        return Err(ValidationError::CapacityExceeded);
    }
    if check_in < today {
        return Err(ValidationError::PastDate);
    }
    if check_in >= check_out {
        return Err(ValidationError::InvertedRange);
    }
    Ok(())
}

// Calendar nights between the dates; 0 when a date is missing or the range is not forward
pub fn nights(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> i64 {
    match (check_in, check_out) {
        (Some(check_in), Some(check_out)) if check_out > check_in => {
            (check_out - check_in).num_days()
        }
        _ => 0,
    }
}

pub fn total_price(room: &Room, nights: i64) -> i64 {
    room.price * nights
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::Rng;
    use test_case::test_case;

    fn room(id: RoomId, capacity: u32, price: i64) -> Room {
        Room {
            id,
            name: format!("Room {}", id),
            capacity,
            price,
            photo_id: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2025-06-10")
    }

    fn selection(capacity: u32, guests: u32, check_in: &str, check_out: &str) -> BookingSelection {
        BookingSelection {
            selected_room: Some(room(1, capacity, 100_000)),
            check_in: Some(date(check_in)),
            check_out: Some(date(check_out)),
            guest_count: guests,
        }
    }

    #[test]
    fn test_bookability_matches_membership() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let rooms: Vec<Room> = (1..=rng.gen_range(1..20))
                .map(|id| room(id, 2, 1000))
                .collect();
            let set: AvailabilitySet = rooms
                .iter()
                .map(|r| r.id)
                .filter(|_| rng.gen_bool(0.5))
                .collect();

            let with_set = compute_bookability(&rooms, Some(&set));
            let without_set = compute_bookability(&rooms, None);
            for r in &rooms {
                assert_eq!(with_set[&r.id], set.contains(r.id));
                assert!(without_set[&r.id]);
            }
        }
    }

    #[test]
    fn test_first_bookable_room() {
        let rooms = vec![room(1, 2, 100), room(2, 4, 200)];
        let set = AvailabilitySet::from_ids([2]);
        assert_eq!(first_bookable(&rooms, Some(&set)).map(|r| r.id), Some(2));
        assert_eq!(first_bookable(&rooms, None).map(|r| r.id), Some(1));
        assert!(first_bookable(&rooms, Some(&AvailabilitySet::default())).is_none());
        assert!(first_bookable(&[], None).is_none());
    }

    #[test_case(2, 2, "2025-06-10", "2025-06-11", Ok(()); "#1 capacity and today are inclusive")]
    #[test_case(2, 3, "2025-06-09", "2025-06-09", Err(ValidationError::CapacityExceeded); "#2 capacity checked before dates")]
    #[test_case(4, 2, "2025-06-09", "2025-06-12", Err(ValidationError::PastDate); "#3 check-in in the past")]
    #[test_case(4, 2, "2025-06-12", "2025-06-12", Err(ValidationError::InvertedRange); "#4 same day range")]
    #[test_case(4, 2, "2025-06-14", "2025-06-12", Err(ValidationError::InvertedRange); "#5 inverted range")]
    #[test_case(4, 0, "2025-06-12", "2025-06-14", Err(ValidationError::MissingSelection); "#6 no guests")]
    #[test_case(4, 2, "2025-06-09", "2025-06-08", Err(ValidationError::PastDate); "#7 past check-in reported before inverted range")]
    #[test_case(4, 2, "2025-06-09", "2025-06-09", Err(ValidationError::PastDate); "#8 past same-day range")]
    fn test_validate_selection(
        capacity: u32,
        guests: u32,
        check_in: &str,
        check_out: &str,
        expected: Result<(), ValidationError>,
    ) {
        let selection = selection(capacity, guests, check_in, check_out);
        assert_eq!(validate_selection(&selection, today()), expected);
    }

    #[test]
    fn test_missing_room_or_dates() {
        let mut s = selection(2, 1, "2025-06-12", "2025-06-13");
        s.selected_room = None;
        assert_eq!(
            validate_selection(&s, today()),
            Err(ValidationError::MissingSelection)
        );

        let mut s = selection(2, 1, "2025-06-12", "2025-06-13");
        s.check_out = None;
        assert_eq!(
            validate_selection(&s, today()),
            Err(ValidationError::MissingSelection)
        );
    }

    #[test]
    fn test_missing_dates_reported_before_capacity() {
        let mut s = selection(2, 5, "2025-06-12", "2025-06-13");
        s.check_in = None;
        s.check_out = None;
        assert_eq!(
            validate_selection(&s, today()),
            Err(ValidationError::MissingSelection)
        );
    }

    #[test]
    fn test_equal_dates_always_inverted() {
        for offset in 0..30 {
            let day = today() + Duration::days(offset);
            let s = BookingSelection {
                selected_room: Some(room(1, 4, 1000)),
                check_in: Some(day),
                check_out: Some(day),
                guest_count: 1,
            };
            assert_eq!(
                validate_selection(&s, today()),
                Err(ValidationError::InvertedRange)
            );
        }
    }

    #[test]
    fn test_nights() {
        let ci = Some(date("2025-01-01"));
        let co = Some(date("2025-01-03"));
        assert_eq!(nights(ci, co), 2);
        assert_eq!(nights(ci, co), nights(ci, co));
        assert_eq!(nights(None, co), 0);
        assert_eq!(nights(ci, None), 0);
        assert_eq!(nights(co, ci), 0);
        // Crosses a month boundary
        assert_eq!(nights(Some(date("2025-01-30")), Some(date("2025-02-02"))), 3);
    }

    #[test]
    fn test_total_price() {
        let r = room(1, 2, 130_000);
        let n = nights(Some(date("2025-06-10")), Some(date("2025-06-13")));
        assert_eq!(total_price(&r, n), 390_000);
        assert_eq!(total_price(&r, n), r.price * n);

        let s = selection(2, 2, "2025-06-10", "2025-06-13");
        assert_eq!(s.nights(), 3);
        assert_eq!(s.total_price(), 300_000);
        assert_eq!(BookingSelection::default().total_price(), 0);
    }

    #[test]
    fn test_query_value_is_sorted() {
        let set = AvailabilitySet::from_ids([5, 2, 9, 2]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_query_value(), "2,5,9");
        assert_eq!(AvailabilitySet::default().to_query_value(), "");
    }
}
