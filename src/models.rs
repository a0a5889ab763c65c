use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type GuesthouseId = i64;
pub type RoomId = i64;
pub type UserId = i64;
pub type ReservationId = i64;
pub type ReviewId = i64;

// Closed set of account roles; the wire form is the upper-case code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Guest,
    Host,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "GUEST",
            Role::Host => "HOST",
        }
    }

    /// Lenient parse used for values read back from client storage.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "GUEST" => Some(Role::Guest),
            "HOST" => Some(Role::Host),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Data structures for guesthouse API responses
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Guesthouse {
    pub id: GuesthouseId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub photo_id: Option<i64>,
    #[serde(default)]
    pub room_count: u32,
}

// Row returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuesthouseSummary {
    pub id: GuesthouseId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub photo_id: Option<i64>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub room_available: Vec<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    // Whole currency units per night
    pub price: i64,
    #[serde(default)]
    pub photo_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub reservation_id: Option<ReservationId>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// Outbound body for POST /reservation; identity travels in the user-id header
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewReservation {
    pub room_id: RoomId,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub people_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuesthouseRef {
    pub id: GuesthouseId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReviewSummary {
    pub id: ReviewId,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

// Entry of GET /reservation/my
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuestReservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub guesthouse: GuesthouseRef,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub people_count: u32,
    #[serde(default)]
    pub review: Option<ReviewSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuestRef {
    pub id: UserId,
    pub username: String,
}

// Entry of GET /guesthouse/{id}/reservations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostReservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub guest: GuestRef,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub people_count: u32,
}

// Entry of GET /guesthouse/mylist
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HostedGuesthouse {
    pub id: GuesthouseId,
    pub name: String,
    #[serde(default)]
    pub room_count: u32,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(alias = "id")]
    pub user_id: UserId,
    pub username: String,
    pub login_id: String,
    pub role: Role,
    #[serde(default)]
    pub phone_number: String,
}

// Body of PATCH /user-info; unset fields are left out of the JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "id")]
    pub user_id: UserId,
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpRequest {
    pub username: String,
    pub login_id: String,
    pub password: String,
    pub role: Role,
    pub phone_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IdCheck {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub reservation_id: ReservationId,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPatch {
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRoom {
    pub name: String,
    pub capacity: u32,
    pub price: i64,
}

// Body of POST /guesthouse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGuesthouse {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone_number: String,
    pub rating: f64,
    pub photo_id: i64,
    #[serde(rename = "roomCount")]
    pub room_count: usize,
    pub rooms: Vec<NewRoom>,
}

// Body of PATCH /guesthouse/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuesthousePatch {
    pub name: String,
    pub description: String,
    pub phone_number: String,
}
