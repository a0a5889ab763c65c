// Guesthouse search: query parameters, the cached last filter, and
// client-side ordering/grouping of results.

use crate::api_client::{ApiClient, ApiError};
use crate::availability::{AvailabilitySet, BookingSelection};
use crate::models::{GuesthouseSummary, Room};
use crate::session_store::LocalStorage;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

pub const LAST_SEARCH_KEY: &str = "stayj_last_search";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchParams {
    pub name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub people: u32,
}

impl SearchParams {
    // One night from `today` for one person, with no name filter
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            check_in: today,
            check_out: today + Duration::days(1),
            people: 1,
        }
    }

    /// Seeds the detail page's selection with the searched dates and party size.
    pub fn selection_for(&self, room: Option<Room>) -> BookingSelection {
        BookingSelection {
            selected_room: room,
            check_in: Some(self.check_in),
            check_out: Some(self.check_out),
            guest_count: self.people,
        }
    }
}

pub fn remember_search(storage: &dyn LocalStorage, params: &SearchParams) {
    match serde_json::to_string(params) {
        Ok(json) => storage.set_item(LAST_SEARCH_KEY, json),
        Err(e) => debug!(error = %e, "Search filter not cached"),
    }
}

// Unparsable cache entries read as absent
pub fn last_search(storage: &dyn LocalStorage) -> Option<SearchParams> {
    storage
        .get_item(LAST_SEARCH_KEY)
        .and_then(|json| serde_json::from_str(&json).ok())
}

/// Runs a search and caches the filter that produced it.
pub async fn search(
    api: &ApiClient,
    storage: &dyn LocalStorage,
    params: &SearchParams,
) -> Result<Vec<GuesthouseSummary>, ApiError> {
    let results = api.search_guesthouses(params).await?;
    remember_search(storage, params);
    debug!(count = results.len(), "Search returned guesthouses");
    Ok(results)
}

impl GuesthouseSummary {
    // Any room free for the searched dates
    pub fn is_bookable(&self) -> bool {
        !self.room_available.is_empty()
    }

    pub fn availability(&self) -> AvailabilitySet {
        self.room_available.iter().copied().collect()
    }

    pub fn region(&self) -> Region {
        Region::of_address(&self.address)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    // Server order
    #[default]
    Recommended,
    Rating,
    ReviewCount,
    Price,
}

pub fn sort_summaries(summaries: &mut [GuesthouseSummary], order: SortOrder) {
    match order {
        SortOrder::Recommended => {}
        SortOrder::Rating => summaries.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .partial_cmp(&a.rating.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        }),
        SortOrder::ReviewCount => {
            summaries.sort_by_key(|s| std::cmp::Reverse(s.review_count.unwrap_or(0)))
        }
        SortOrder::Price => summaries.sort_by_key(|s| s.min_price.unwrap_or(0)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    JejuCity,
    Seogwipo,
    Other,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::JejuCity, Region::Seogwipo, Region::Other];

    pub fn of_address(address: &str) -> Self {
        if address.contains("제주시") {
            Region::JejuCity
        } else if address.contains("서귀포시") {
            Region::Seogwipo
        } else {
            Region::Other
        }
    }
}

// Buckets results by region, keeping their relative order
pub fn group_by_region(
    summaries: Vec<GuesthouseSummary>,
) -> Vec<(Region, Vec<GuesthouseSummary>)> {
    let mut groups: Vec<(Region, Vec<GuesthouseSummary>)> =
        Region::ALL.iter().map(|r| (*r, Vec::new())).collect();
    for summary in summaries {
        let region = summary.region();
        if let Some((_, bucket)) = groups.iter_mut().find(|(r, _)| *r == region) {
            bucket.push(summary);
        }
    }
    groups
}
