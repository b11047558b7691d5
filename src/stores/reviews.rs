// Reviews: admin moderation list, public listing and guest submission

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{error, info};

use super::{DeleteConfirmation, LoadStatus, PendingDelete};
use crate::api::{BookingApi, ReviewFilters};
use crate::error::{Error, Result};
use crate::models::{Booking, BookingStatus, Review};
use crate::pagination::{paginate, total_pages, Page};
use crate::validation::{validate_form, ReviewForm};

pub const REVIEWS_PER_PAGE: u32 = 10;

/// A booking can be reviewed once it is confirmed and the guest has
/// checked out.
pub fn can_review_booking(booking: &Booking, now: DateTime<Utc>) -> bool {
    booking.status == BookingStatus::Confirmed && booking.check_out < now
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub reviews: Vec<Review>,
    pub public_reviews: Vec<Review>,
    pub filters: ReviewFilters,
    // the admin listing is not paged by the server
    pub page: u32,
    pub status: LoadStatus,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            reviews: Vec::new(),
            public_reviews: Vec::new(),
            filters: ReviewFilters::default(),
            page: 1,
            status: LoadStatus::default(),
        }
    }
}

impl ReviewState {
    pub fn current_page(&self) -> Page<Review> {
        paginate(&self.reviews, self.page, REVIEWS_PER_PAGE)
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.reviews.len() as u64, REVIEWS_PER_PAGE)
    }
}

pub struct ReviewStore {
    api: BookingApi,
    state: RwLock<ReviewState>,
}

impl ReviewStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(ReviewState::default()),
        }
    }

    pub fn snapshot(&self) -> ReviewState {
        self.state.read().clone()
    }

    pub fn set_page(&self, page: u32) {
        self.state.write().page = page.max(1);
    }

    fn fail(&self, e: &Error, fallback: &str) {
        self.state.write().status.fail(e.user_message(fallback));
    }

    pub async fn fetch_reviews(&self) -> Result<()> {
        let filters = {
            let mut state = self.state.write();
            state.status.start();
            state.filters.clone()
        };

        match self.api.list_reviews(&filters).await {
            Ok(reviews) => {
                let mut state = self.state.write();
                state.reviews = reviews;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch reviews failed");
                self.fail(&e, "Failed to fetch reviews");
                Err(e)
            }
        }
    }

    pub async fn set_filters(&self, filters: ReviewFilters) -> Result<()> {
        {
            let mut state = self.state.write();
            state.filters = filters;
            state.page = 1;
        }
        self.fetch_reviews().await
    }

    pub async fn clear_filters(&self) -> Result<()> {
        self.set_filters(ReviewFilters::default()).await
    }

    pub async fn fetch_public_reviews(&self, room_type_id: Option<i64>) -> Result<Vec<Review>> {
        self.state.write().status.start();

        match self.api.public_reviews(room_type_id).await {
            Ok(reviews) => {
                let mut state = self.state.write();
                state.public_reviews = reviews.clone();
                state.status.succeed();
                Ok(reviews)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch public reviews failed");
                self.fail(&e, "Failed to fetch reviews");
                Err(e)
            }
        }
    }

    /// Submit a review for `booking`. Ineligible bookings are rejected
    /// before anything is sent.
    pub async fn create_review(
        &self,
        booking: &Booking,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<Review> {
        if !can_review_booking(booking, now) {
            return Err(Error::ReviewNotAllowed);
        }
        let room_type_id = booking
            .resolved_room_type_id()
            .ok_or(Error::ReviewNotAllowed)?;
        let form = ReviewForm {
            room_type_id,
            rating,
            comment: comment.trim().to_string(),
        };
        validate_form(&form)?;
        self.state.write().status.start();

        match self.api.create_review(&form).await {
            Ok(review) => {
                info!(booking_id = booking.id, rating, "review submitted");
                self.state.write().status.succeed();
                Ok(review)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(booking_id = booking.id, error = %e, "create review failed");
                self.fail(&e, "Failed to submit review");
                Err(e)
            }
        }
    }

    pub fn request_delete(&self, id: i64) -> PendingDelete<Review> {
        PendingDelete::new(id)
    }

    pub async fn delete_review(&self, confirmation: DeleteConfirmation<Review>) -> Result<()> {
        let id = confirmation.id();
        self.api.delete_review(id).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "delete review failed");
            self.fail(&e, "Failed to delete review");
            e
        })?;

        let _ = self.fetch_reviews().await;
        Ok(())
    }

    pub async fn toggle_visibility(&self, id: i64, is_visible: bool) -> Result<Review> {
        let review = self
            .api
            .set_review_visibility(id, is_visible)
            .await
            .map_err(|e| {
                let e = Error::from(e);
                error!(id, error = %e, "toggle review visibility failed");
                self.fail(&e, "Failed to update review visibility");
                e
            })?;

        let _ = self.fetch_reviews().await;
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::MockServer;
    use chrono::TimeZone;
    use reqwest::Method;
    use serde_json::{json, Value};
    use test_case::test_case;

    fn booking(status: &str, check_out: &str) -> Booking {
        serde_json::from_value(json!({
            "id": 11,
            "roomTypeId": 2,
            "checkIn": "2024-06-01T00:00:00Z",
            "checkOut": check_out,
            "nights": 3,
            "roomPrice": 100.0,
            "totalPrice": 300.0,
            "status": status
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn reviews(count: usize) -> Value {
        let items: Vec<Value> = (1..=count)
            .map(|i| json!({"id": i, "rating": 4, "comment": "Nice stay", "isVisible": true}))
            .collect();
        Value::Array(items)
    }

    #[test_case("confirmed", "2024-06-04T00:00:00Z", true ; "confirmed and checked out")]
    #[test_case("confirmed", "2024-06-20T00:00:00Z", false ; "checkout in the future")]
    #[test_case("pending", "2024-06-04T00:00:00Z", false ; "still pending")]
    #[test_case("cancelled", "2024-06-04T00:00:00Z", false ; "cancelled")]
    fn test_can_review_booking(status: &str, check_out: &str, expected: bool) {
        assert_eq!(can_review_booking(&booking(status, check_out), now()), expected);
    }

    #[tokio::test]
    async fn test_future_checkout_never_reaches_api() {
        let server = MockServer::new();
        let store = ReviewStore::new(server.api());

        let result = store
            .create_review(&booking("confirmed", "2024-06-20T00:00:00Z"), 5, "Great", now())
            .await;
        assert!(matches!(result, Err(Error::ReviewNotAllowed)));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_booking_without_room_type_cannot_be_reviewed() {
        let server = MockServer::new();
        let store = ReviewStore::new(server.api());
        let orphan: Booking = serde_json::from_value(json!({
            "id": 12,
            "checkIn": "2024-06-01T00:00:00Z",
            "checkOut": "2024-06-04T00:00:00Z",
            "nights": 3,
            "roomPrice": 100.0,
            "totalPrice": 300.0,
            "status": "confirmed"
        }))
        .unwrap();

        let result = store.create_review(&orphan, 4, "Fine", now()).await;
        assert!(matches!(result, Err(Error::ReviewNotAllowed)));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_review_posts_room_type() {
        let server = MockServer::new();
        server.respond(
            Method::POST,
            "/reviews",
            json!({"id": 3, "roomTypeId": 2, "rating": 5, "comment": "Great"}),
        );
        let store = ReviewStore::new(server.api());

        let review = store
            .create_review(&booking("confirmed", "2024-06-04T00:00:00Z"), 5, " Great ", now())
            .await
            .unwrap();
        assert_eq!(review.id, 3);
        assert_eq!(
            server.last_request().unwrap().body,
            Some(json!({"roomTypeId": 2, "rating": 5, "comment": "Great"}))
        );
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_a_field_error() {
        let server = MockServer::new();
        let store = ReviewStore::new(server.api());

        let result = store
            .create_review(&booking("confirmed", "2024-06-04T00:00:00Z"), 6, "", now())
            .await;
        match result {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.get("rating"), Some("Rating must be between 1 and 5"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filter_change_resets_page_and_refetches() {
        let server = MockServer::new();
        server.respond(Method::GET, "/reviews/admin/all", reviews(25));
        let store = ReviewStore::new(server.api());
        store.fetch_reviews().await.unwrap();

        store.set_page(3);
        assert_eq!(store.snapshot().current_page().items.len(), 5);

        store
            .set_filters(ReviewFilters {
                rating: Some(4),
                ..ReviewFilters::default()
            })
            .await
            .unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.page, 1);
        assert_eq!(snapshot.total_pages(), 3);
        assert_eq!(
            server.last_request().unwrap().query_value("rating"),
            Some("4")
        );
    }

    #[tokio::test]
    async fn test_toggle_visibility_refetches() {
        let server = MockServer::new();
        server.respond(
            Method::PATCH,
            "/reviews/4/visibility",
            json!({"review": {"id": 4, "rating": 2, "isVisible": false}}),
        );
        server.respond(Method::GET, "/reviews/admin/all", reviews(2));
        let store = ReviewStore::new(server.api());

        let review = store.toggle_visibility(4, false).await.unwrap();
        assert!(!review.is_visible);
        assert_eq!(
            server.requests_to(Method::PATCH, "/reviews/4/visibility")[0].body,
            Some(json!({"isVisible": false}))
        );
        assert_eq!(store.snapshot().reviews.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_list() {
        let server = MockServer::new();
        server.respond(Method::GET, "/reviews/admin/all", reviews(2));
        server.fail(Method::DELETE, "/reviews/1", 403, "Admin access required");
        let store = ReviewStore::new(server.api());
        store.fetch_reviews().await.unwrap();

        let pending = store.request_delete(1);
        assert!(store.delete_review(pending.confirm()).await.is_err());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.reviews.len(), 2);
        assert_eq!(snapshot.status.error.as_deref(), Some("Admin access required"));
    }

    #[tokio::test]
    async fn test_public_reviews_by_room_type() {
        let server = MockServer::new();
        server.respond(Method::GET, "/reviews/public", reviews(3));
        let store = ReviewStore::new(server.api());

        let list = store.fetch_public_reviews(Some(2)).await.unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(
            server.last_request().unwrap().query_value("roomTypeId"),
            Some("2")
        );
    }
}
