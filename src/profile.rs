// Guest "my page": profile edits, reservation cancellation and reviews.

use crate::api_client::{ApiClient, ApiError};
use crate::models::{
    GuestReservation, NewReview, ReservationId, ReviewId, ReviewPatch, ReviewSummary, User,
    UserPatch,
};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    pub username: String,
    pub phone_number: String,
    // Blank keeps the current password
    pub password: String,
}

impl ProfileEdit {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            phone_number: user.phone_number.clone(),
            password: String::new(),
        }
    }

    pub fn to_patch(&self) -> UserPatch {
        UserPatch {
            username: Some(self.username.clone()),
            phone_number: Some(self.phone_number.clone()),
            password: (!self.password.trim().is_empty()).then(|| self.password.clone()),
        }
    }
}

pub async fn load_profile(api: &ApiClient) -> Result<User, ApiError> {
    let user_id = api.session().get().user_id.ok_or(ApiError::MissingIdentity)?;
    api.get_user(user_id).await
}

/// Saves `edit` for the logged-in user and returns the user as it now reads.
pub async fn save_profile(
    api: &ApiClient,
    current: &User,
    edit: &ProfileEdit,
) -> Result<User, ApiError> {
    let patch = edit.to_patch();
    api.update_user(current.user_id, &patch).await?;
    info!(user_id = current.user_id, password_changed = patch.password.is_some(), "Profile updated");

    let mut updated = current.clone();
    if let Some(username) = patch.username {
        updated.username = username;
    }
    if let Some(phone_number) = patch.phone_number {
        updated.phone_number = phone_number;
    }
    Ok(updated)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CancellationError {
    #[error("Reservations can only be cancelled before check-in day")]
    AlreadyStarted,

    #[error(transparent)]
    Api(#[from] ApiError),
}

// Cancellable strictly before the check-in day
pub fn is_cancelable(check_in: NaiveDate, today: NaiveDate) -> bool {
    check_in > today
}

pub async fn cancel_reservation(
    api: &ApiClient,
    reservation: &GuestReservation,
    today: NaiveDate,
) -> Result<(), CancellationError> {
    if !is_cancelable(reservation.check_in_date, today) {
        return Err(CancellationError::AlreadyStarted);
    }
    api.cancel_reservation(reservation.id).await?;
    info!(reservation_id = reservation.id, "Reservation cancelled");
    Ok(())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Choose a rating from 1 to 5")]
    MissingRating,

    #[error("Review text cannot be empty")]
    EmptyComment,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    // 0 until a star is picked
    pub rating: u8,
    pub comment: String,
}

impl ReviewDraft {
    pub fn from_existing(review: &ReviewSummary) -> Self {
        Self {
            rating: review.rating,
            comment: review.comment.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::MissingRating);
        }
        if self.comment.trim().is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        Ok(())
    }
}

pub async fn create_review(
    api: &ApiClient,
    reservation_id: ReservationId,
    draft: &ReviewDraft,
) -> Result<(), ReviewError> {
    draft.validate()?;
    let review = NewReview {
        reservation_id,
        rating: draft.rating,
        comment: draft.comment.trim().to_string(),
    };
    api.create_review(&review).await?;
    info!(reservation_id, "Review created");
    Ok(())
}

pub async fn update_review(
    api: &ApiClient,
    review_id: ReviewId,
    draft: &ReviewDraft,
) -> Result<(), ReviewError> {
    draft.validate()?;
    let patch = ReviewPatch {
        rating: draft.rating,
        comment: draft.comment.trim().to_string(),
    };
    api.update_review(review_id, &patch).await?;
    info!(review_id, "Review updated");
    Ok(())
}

pub async fn delete_review(api: &ApiClient, review_id: ReviewId) -> Result<(), ReviewError> {
    api.delete_review(review_id).await?;
    info!(review_id, "Review deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::mock_server::{client_with, guest_storage, MockServer};
    use crate::api_client::{Method, USER_ID_HEADER};
    use crate::models::{GuesthouseRef, Role};
    use crate::session_store::ClientStorage;
    use serde_json::json;
    use std::sync::Arc;
    use test_case::test_case;
    use tokio_test::assert_ok;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn user() -> User {
        User {
            user_id: 8,
            username: "Kim".to_string(),
            login_id: "jeju_lover".to_string(),
            role: Role::Guest,
            phone_number: "010-1111-2222".to_string(),
        }
    }

    fn reservation(id: ReservationId, check_in: &str) -> GuestReservation {
        GuestReservation {
            id,
            room_id: 2,
            guesthouse: GuesthouseRef {
                id: 1,
                name: "Hanok Stay".to_string(),
            },
            check_in_date: date(check_in),
            check_out_date: date(check_in) + chrono::Duration::days(2),
            people_count: 2,
            review: None,
        }
    }

    #[test]
    fn test_blank_password_left_out_of_patch() {
        let mut edit = ProfileEdit::from_user(&user());
        edit.password = "   ".to_string();
        let patch = edit.to_patch();
        assert_eq!(patch.password, None);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"username": "Kim", "phone_number": "010-1111-2222"})
        );

        edit.password = "new-secret".to_string();
        assert_eq!(edit.to_patch().password, Some("new-secret".to_string()));
    }

    #[tokio::test]
    async fn test_load_and_save_profile() {
        let server = Arc::new(MockServer::new());
        server.respond_json(
            Method::GET,
            "/user/8",
            json!({"user_id": 8, "username": "Kim", "login_id": "jeju_lover", "role": "GUEST", "phone_number": "010-1111-2222"}),
        );
        server.respond(Method::PATCH, "/user-info", 200, "");
        let client = client_with(server.clone(), guest_storage(8));

        let current = assert_ok!(load_profile(&client).await);
        assert_eq!(current, user());

        let mut edit = ProfileEdit::from_user(&current);
        edit.username = "Lee".to_string();
        let updated = assert_ok!(save_profile(&client, &current, &edit).await);
        assert_eq!(updated.username, "Lee");
        assert_eq!(updated.login_id, "jeju_lover");

        let sent = server.requests_to(Method::PATCH, "/user-info");
        assert_eq!(sent[0].header(USER_ID_HEADER), Some("8"));
    }

    #[tokio::test]
    async fn test_load_profile_needs_session() {
        let server = Arc::new(MockServer::new());
        let client = client_with(server.clone(), Arc::new(ClientStorage::in_memory()));

        assert_eq!(load_profile(&client).await, Err(ApiError::MissingIdentity));
        assert!(server.requests().is_empty());
    }

    #[test_case("2025-06-11", true; "#1 tomorrow")]
    #[test_case("2025-06-10", false; "#2 today")]
    #[test_case("2025-06-01", false; "#3 past")]
    fn test_is_cancelable(check_in: &str, expected: bool) {
        assert_eq!(is_cancelable(date(check_in), date("2025-06-10")), expected);
    }

    #[tokio::test]
    async fn test_cancel_started_reservation_makes_no_request() {
        let server = Arc::new(MockServer::new());
        server.respond(Method::DELETE, "/reservation/3", 200, "");
        let client = client_with(server.clone(), guest_storage(8));
        let today = date("2025-06-10");

        let result = cancel_reservation(&client, &reservation(3, "2025-06-10"), today).await;
        assert_eq!(result, Err(CancellationError::AlreadyStarted));
        assert!(server.requests().is_empty());

        assert_ok!(cancel_reservation(&client, &reservation(3, "2025-06-12"), today).await);
        assert_eq!(server.requests_to(Method::DELETE, "/reservation/3").len(), 1);
    }

    #[test_case(0, "Great", Err(ReviewError::MissingRating); "#1 no stars")]
    #[test_case(6, "Great", Err(ReviewError::MissingRating); "#2 out of range")]
    #[test_case(4, "  ", Err(ReviewError::EmptyComment); "#3 blank comment")]
    #[test_case(5, "Great", Ok(()); "#4 valid")]
    fn test_review_draft_validation(rating: u8, comment: &str, expected: Result<(), ReviewError>) {
        let draft = ReviewDraft {
            rating,
            comment: comment.to_string(),
        };
        assert_eq!(draft.validate(), expected);
    }

    #[tokio::test]
    async fn test_review_lifecycle() {
        let server = Arc::new(MockServer::new());
        server.respond_json(Method::POST, "/review", json!({"id": 12}));
        server.respond(Method::PATCH, "/review/12", 200, "");
        server.respond(Method::DELETE, "/review/12", 200, "");
        let client = client_with(server.clone(), guest_storage(8));

        let draft = ReviewDraft {
            rating: 5,
            comment: " Lovely stay ".to_string(),
        };
        assert_ok!(create_review(&client, 101, &draft).await);
        let posted = server.requests_to(Method::POST, "/review");
        assert_eq!(
            posted[0].json_body(),
            Some(json!({"reservation_id": 101, "rating": 5, "comment": "Lovely stay"}))
        );

        let mut edited = ReviewDraft::from_existing(&ReviewSummary {
            id: 12,
            rating: 5,
            comment: "Lovely stay".to_string(),
        });
        edited.rating = 4;
        assert_ok!(update_review(&client, 12, &edited).await);
        let patched = server.requests_to(Method::PATCH, "/review/12");
        assert_eq!(
            patched[0].json_body(),
            Some(json!({"rating": 4, "comment": "Lovely stay"}))
        );

        assert_ok!(delete_review(&client, 12).await);
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_review_makes_no_request() {
        let server = Arc::new(MockServer::new());
        let client = client_with(server.clone(), guest_storage(8));

        let result = create_review(&client, 101, &ReviewDraft::default()).await;
        assert_eq!(result, Err(ReviewError::MissingRating));
        assert!(server.requests().is_empty());
    }
}
