// Bookings: admin listing, the guest's own bookings, and status changes
//
// Unlike the other stores, status changes and deletes patch local state
// before the request goes out, then reconcile with a re-fetch (or roll back
// when the request fails).

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::{error, info};

use super::{DeleteConfirmation, LoadStatus, PendingDelete};
use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::{Actor, Booking, BookingStatus, CreateBookingRequest};
use crate::pagination::{total_pages, ListQuery};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingState {
    pub bookings: Vec<Booking>,
    pub my_bookings: Vec<Booking>,
    // detail view, also the target of status changes made from it
    pub booking: Option<Booking>,
    pub total: u64,
    pub query: ListQuery,
    // None means "all"
    pub status_filter: Option<BookingStatus>,
    pub status: LoadStatus,
}

impl BookingState {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.query.limit)
    }

    fn find(&self, id: i64) -> Option<&Booking> {
        self.bookings
            .iter()
            .chain(self.my_bookings.iter())
            .chain(self.booking.iter())
            .find(|b| b.id == id)
    }

    fn set_status(&mut self, id: i64, status: BookingStatus) {
        for booking in self
            .bookings
            .iter_mut()
            .chain(self.my_bookings.iter_mut())
            .chain(self.booking.iter_mut())
            .filter(|b| b.id == id)
        {
            booking.status = status;
        }
    }

    fn replace(&mut self, updated: &Booking) {
        for booking in self
            .bookings
            .iter_mut()
            .chain(self.my_bookings.iter_mut())
            .chain(self.booking.iter_mut())
            .filter(|b| b.id == updated.id)
        {
            *booking = updated.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomTypeRevenue {
    pub room_type: String,
    pub revenue: f64,
}

pub struct BookingStore {
    api: BookingApi,
    state: RwLock<BookingState>,
}

impl BookingStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(BookingState::default()),
        }
    }

    pub fn snapshot(&self) -> BookingState {
        self.state.read().clone()
    }

    pub fn set_page(&self, page: u32) {
        self.state.write().query.set_page(page);
    }

    pub fn set_search(&self, search: &str) {
        self.state.write().query.set_search(search);
    }

    pub fn set_status_filter(&self, status: Option<BookingStatus>) {
        let mut state = self.state.write();
        state.status_filter = status;
        state.query.set_page(1);
    }

    fn fail(&self, e: &Error, fallback: &str) {
        self.state.write().status.fail(e.user_message(fallback));
    }

    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking> {
        if request.check_out <= request.check_in {
            return Err(Error::InvalidDates);
        }
        self.state.write().status.start();

        match self.api.create_booking(request).await {
            Ok(booking) => {
                info!(booking_id = booking.id, room_type_id = request.room_type_id, "booking created");
                let mut state = self.state.write();
                state.bookings.insert(0, booking.clone());
                state.my_bookings.insert(0, booking.clone());
                state.total += 1;
                state.status.succeed();
                Ok(booking)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "create booking failed");
                self.fail(&e, "Failed to create booking");
                Err(e)
            }
        }
    }

    pub async fn fetch_bookings(&self) -> Result<()> {
        let (query, status_filter) = {
            let mut state = self.state.write();
            state.status.start();
            (state.query.clone(), state.status_filter)
        };

        match self.api.list_bookings(&query, status_filter).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.bookings = page.items;
                state.total = page.total;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch bookings failed");
                self.fail(&e, "Failed to fetch bookings");
                Err(e)
            }
        }
    }

    pub async fn fetch_my_bookings(&self) -> Result<()> {
        self.state.write().status.start();

        match self.api.my_bookings().await {
            Ok(bookings) => {
                let mut state = self.state.write();
                state.my_bookings = bookings;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch my bookings failed");
                self.fail(&e, "Failed to fetch your bookings");
                Err(e)
            }
        }
    }

    pub async fn get_booking_by_id(&self, id: i64) -> Result<Booking> {
        self.state.write().status.start();

        match self.api.get_booking(id).await {
            Ok(booking) => {
                let mut state = self.state.write();
                state.booking = Some(booking.clone());
                state.status.succeed();
                Ok(booking)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(id, error = %e, "get booking failed");
                self.fail(&e, "Failed to fetch booking");
                Err(e)
            }
        }
    }

    /// Move a booking to `next` on behalf of `actor`.
    ///
    /// Disallowed transitions are rejected before any request. Allowed ones
    /// are applied locally first, sent, and then reconciled against the
    /// listing the actor looks at; a failed request restores the old status.
    pub async fn update_booking_status(
        &self,
        id: i64,
        next: BookingStatus,
        actor: Actor,
    ) -> Result<Booking> {
        let previous = {
            let mut state = self.state.write();
            let current = state
                .find(id)
                .map(|b| b.status)
                .ok_or(Error::BookingNotFound(id))?;
            if !current.can_transition_to(next, actor) {
                return Err(Error::InvalidTransition {
                    from: current,
                    to: next,
                });
            }
            state.set_status(id, next);
            state.status.start();
            current
        };

        match self.api.update_booking_status(id, next).await {
            Ok(updated) => {
                info!(id, from = %previous, to = %next, "booking status updated");
                {
                    let mut state = self.state.write();
                    state.replace(&updated);
                    state.status.succeed();
                }
                let _ = match actor {
                    Actor::Admin => self.fetch_bookings().await,
                    Actor::Owner => self.fetch_my_bookings().await,
                };
                Ok(updated)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(id, error = %e, "update booking status failed");
                let mut state = self.state.write();
                state.set_status(id, previous);
                state.status.fail(e.user_message("Failed to update booking status"));
                Err(e)
            }
        }
    }

    pub fn request_delete(&self, id: i64) -> PendingDelete<Booking> {
        PendingDelete::new(id)
    }

    pub async fn delete_booking(&self, confirmation: DeleteConfirmation<Booking>) -> Result<()> {
        let id = confirmation.id();
        let saved = {
            let mut state = self.state.write();
            let saved = state.clone();
            let before = state.bookings.len();
            state.bookings.retain(|b| b.id != id);
            state.my_bookings.retain(|b| b.id != id);
            if state.booking.as_ref().map_or(false, |b| b.id == id) {
                state.booking = None;
            }
            if state.bookings.len() < before {
                state.total = state.total.saturating_sub(1);
            }
            state.status.start();
            saved
        };

        match self.api.delete_booking(id).await {
            Ok(()) => {
                self.state.write().status.succeed();
                let _ = self.fetch_bookings().await;
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(id, error = %e, "delete booking failed");
                let mut state = self.state.write();
                state.bookings = saved.bookings;
                state.my_bookings = saved.my_bookings;
                state.booking = saved.booking;
                state.total = saved.total;
                state.status.fail(e.user_message("Failed to delete booking"));
                Err(e)
            }
        }
    }

    // Revenue from confirmed bookings in the loaded admin listing
    pub fn total_revenue(&self) -> f64 {
        total_revenue(&self.state.read().bookings)
    }

    pub fn revenue_by_room_type(&self) -> Vec<RoomTypeRevenue> {
        revenue_by_room_type(&self.state.read().bookings)
    }
}

pub fn total_revenue(bookings: &[Booking]) -> f64 {
    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
        .map(|b| b.total_price)
        .sum()
}

pub fn revenue_by_room_type(bookings: &[Booking]) -> Vec<RoomTypeRevenue> {
    let mut revenue: BTreeMap<String, f64> = BTreeMap::new();
    for booking in bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
    {
        *revenue
            .entry(booking.room_type_name().to_string())
            .or_default() += booking.total_price;
    }
    revenue
        .into_iter()
        .map(|(room_type, revenue)| RoomTypeRevenue { room_type, revenue })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::mock_server::MockServer;
    use reqwest::Method;
    use serde_json::{json, Value};
    use tokio_test::assert_ok;

    fn booking_json(id: i64, status: &str, room: &str, total: f64) -> Value {
        json!({
            "id": id,
            "roomTypeId": 1,
            "roomType": {"id": 1, "type": room},
            "checkIn": "2024-06-01T00:00:00Z",
            "checkOut": "2024-06-04T00:00:00Z",
            "nights": 3,
            "roomPrice": total / 3.0,
            "totalPrice": total,
            "status": status
        })
    }

    fn booking(id: i64, status: &str, room: &str, total: f64) -> Booking {
        serde_json::from_value(booking_json(id, status, room, total)).unwrap()
    }

    async fn store_with_admin_list(server: &std::sync::Arc<MockServer>) -> BookingStore {
        server.respond(
            Method::GET,
            "/bookings",
            json!({"bookings": [booking_json(1, "pending", "Deluxe", 300.0),
                                booking_json(2, "confirmed", "Suite", 500.0)],
                   "total": 2}),
        );
        let store = BookingStore::new(server.api());
        assert_ok!(store.fetch_bookings().await);
        store
    }

    #[tokio::test]
    async fn test_status_filter_resets_page_and_is_sent() {
        let server = MockServer::new();
        let store = store_with_admin_list(&server).await;

        store.set_page(2);
        store.set_status_filter(Some(BookingStatus::Pending));
        assert_eq!(store.snapshot().query.page, 1);

        store.fetch_bookings().await.unwrap();
        let sent = server.last_request().unwrap();
        assert_eq!(sent.query_value("status"), Some("pending"));
        assert_eq!(sent.query_value("page"), Some("1"));
    }

    #[tokio::test]
    async fn test_admin_confirms_pending_booking() {
        let server = MockServer::new();
        let store = store_with_admin_list(&server).await;
        server.respond(
            Method::PATCH,
            "/bookings/1/status",
            booking_json(1, "confirmed", "Deluxe", 300.0),
        );

        let updated = store
            .update_booking_status(1, BookingStatus::Confirmed, Actor::Admin)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);

        let patch = server.requests_to(Method::PATCH, "/bookings/1/status");
        assert_eq!(patch[0].body, Some(json!({"status": "confirmed"})));
        // reconciled with a fresh listing
        assert_eq!(server.requests_to(Method::GET, "/bookings").len(), 2);
    }

    #[tokio::test]
    async fn test_terminal_status_rejected_locally() {
        let server = MockServer::new();
        let store = store_with_admin_list(&server).await;

        let result = store
            .update_booking_status(2, BookingStatus::Cancelled, Actor::Admin)
            .await;
        assert!(matches!(
            result,
            Err(Error::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled
            })
        ));
        assert!(server.requests_to(Method::PATCH, "/bookings/2/status").is_empty());
    }

    #[tokio::test]
    async fn test_owner_cannot_confirm() {
        let server = MockServer::new();
        server.respond(
            Method::GET,
            "/bookings/my",
            json!([booking_json(5, "pending", "Deluxe", 300.0)]),
        );
        let store = BookingStore::new(server.api());
        store.fetch_my_bookings().await.unwrap();

        let result = store
            .update_booking_status(5, BookingStatus::Confirmed, Actor::Owner)
            .await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_owner_cancel_reconciles_my_bookings() {
        let server = MockServer::new();
        server.respond_once(
            Method::GET,
            "/bookings/my",
            Ok(json!([booking_json(5, "pending", "Deluxe", 300.0)])),
        );
        server.respond(
            Method::GET,
            "/bookings/my",
            json!([booking_json(5, "cancelled", "Deluxe", 300.0)]),
        );
        server.respond(
            Method::PATCH,
            "/bookings/5/status",
            booking_json(5, "cancelled", "Deluxe", 300.0),
        );
        let store = BookingStore::new(server.api());
        store.fetch_my_bookings().await.unwrap();

        store
            .update_booking_status(5, BookingStatus::Cancelled, Actor::Owner)
            .await
            .unwrap();
        assert_eq!(server.requests_to(Method::GET, "/bookings/my").len(), 2);
        assert_eq!(
            store.snapshot().my_bookings[0].status,
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_failed_status_update_rolls_back() {
        let server = MockServer::new();
        let store = store_with_admin_list(&server).await;
        server.fail(Method::PATCH, "/bookings/1/status", 409, "Room no longer available");

        let result = store
            .update_booking_status(1, BookingStatus::Confirmed, Actor::Admin)
            .await;
        assert!(result.is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.bookings[0].status, BookingStatus::Pending);
        assert_eq!(
            snapshot.status.error.as_deref(),
            Some("Room no longer available")
        );
        assert!(!snapshot.status.loading);
    }

    #[tokio::test]
    async fn test_status_change_from_detail_view() {
        let server = MockServer::new();
        server.respond(
            Method::GET,
            "/bookings/3",
            booking_json(3, "pending", "Suite", 500.0),
        );
        server.respond(
            Method::PATCH,
            "/bookings/3/status",
            booking_json(3, "confirmed", "Suite", 500.0),
        );
        server.respond(Method::GET, "/bookings", json!({"bookings": [], "total": 0}));
        let store = BookingStore::new(server.api());

        store.get_booking_by_id(3).await.unwrap();
        store
            .update_booking_status(3, BookingStatus::Confirmed, Actor::Admin)
            .await
            .unwrap();
        assert_eq!(
            store.snapshot().booking.map(|b| b.status),
            Some(BookingStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn test_unknown_booking() {
        let server = MockServer::new();
        let store = BookingStore::new(server.api());
        let result = store
            .update_booking_status(77, BookingStatus::Cancelled, Actor::Owner)
            .await;
        assert!(matches!(result, Err(Error::BookingNotFound(77))));
    }

    #[tokio::test]
    async fn test_failed_delete_restores_rows() {
        let server = MockServer::new();
        let store = store_with_admin_list(&server).await;
        server.respond_once(
            Method::DELETE,
            "/bookings/1",
            Err(ApiError::NetworkError("offline".to_string())),
        );

        let pending = store.request_delete(1);
        assert!(store.delete_booking(pending.confirm()).await.is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.bookings.len(), 2);
        assert_eq!(snapshot.total, 2);
        assert_eq!(
            snapshot.status.error.as_deref(),
            Some("Failed to delete booking")
        );
    }

    #[tokio::test]
    async fn test_create_booking_prepends() {
        let server = MockServer::new();
        server.respond(
            Method::POST,
            "/bookings",
            booking_json(9, "pending", "Deluxe", 300.0),
        );
        let store = BookingStore::new(server.api());
        let b = booking(9, "pending", "Deluxe", 300.0);

        let created = store
            .create_booking(&CreateBookingRequest {
                room_type_id: 1,
                check_in: b.check_in,
                check_out: b.check_out,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 9);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.my_bookings[0].id, 9);
        assert_eq!(snapshot.total, 1);
    }

    #[test]
    fn test_revenue_counts_confirmed_only() {
        let bookings = vec![
            booking(1, "confirmed", "Deluxe", 300.0),
            booking(2, "confirmed", "Deluxe", 200.0),
            booking(3, "pending", "Suite", 900.0),
            booking(4, "confirmed", "Suite", 450.0),
        ];
        assert_eq!(total_revenue(&bookings), 950.0);
        assert_eq!(
            revenue_by_room_type(&bookings),
            vec![
                RoomTypeRevenue {
                    room_type: "Deluxe".to_string(),
                    revenue: 500.0
                },
                RoomTypeRevenue {
                    room_type: "Suite".to_string(),
                    revenue: 450.0
                },
            ]
        );
    }
}
