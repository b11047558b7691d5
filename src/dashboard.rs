// Admin dashboard figures derived from the entity stores

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Booking, Review, RoomType};
use crate::stores::bookings::{revenue_by_room_type, total_revenue, RoomTypeRevenue};
use crate::stores::{BookingStore, ReviewStore, RoomStore, UserStore};

// Number of room types plotted in the inventory chart
pub const INVENTORY_SERIES_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryPoint {
    pub room_type: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub revenue_by_room_type: Vec<RoomTypeRevenue>,
    pub total_bookings: u64,
    pub total_users: u64,
    pub total_room_types: u64,
    pub total_rooms: u64,
    pub total_reviews: u64,
    // one decimal place, 0.0 without reviews
    pub average_rating: f64,
    pub inventory: Vec<InventoryPoint>,
}

pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let average = f64::from(sum) / reviews.len() as f64;
    (average * 10.0).round() / 10.0
}

pub fn inventory_series(rooms: &[RoomType]) -> Vec<InventoryPoint> {
    rooms
        .iter()
        .take(INVENTORY_SERIES_LEN)
        .map(|room| InventoryPoint {
            room_type: room.name.clone(),
            quantity: room.quantity,
        })
        .collect()
}

impl DashboardSummary {
    pub fn compute(
        bookings: &[Booking],
        total_bookings: u64,
        rooms: &[RoomType],
        reviews: &[Review],
        total_users: u64,
    ) -> Self {
        Self {
            total_revenue: total_revenue(bookings),
            revenue_by_room_type: revenue_by_room_type(bookings),
            total_bookings,
            total_users,
            total_room_types: rooms.len() as u64,
            total_rooms: rooms.iter().map(|r| u64::from(r.quantity)).sum(),
            total_reviews: reviews.len() as u64,
            average_rating: average_rating(reviews),
            inventory: inventory_series(rooms),
        }
    }
}

pub struct Dashboard {
    bookings: Arc<BookingStore>,
    rooms: Arc<RoomStore>,
    reviews: Arc<ReviewStore>,
    users: Arc<UserStore>,
}

impl Dashboard {
    pub fn new(
        bookings: Arc<BookingStore>,
        rooms: Arc<RoomStore>,
        reviews: Arc<ReviewStore>,
        users: Arc<UserStore>,
    ) -> Self {
        Self {
            bookings,
            rooms,
            reviews,
            users,
        }
    }

    /// Refresh the four listings concurrently and summarise them. The first
    /// failure is returned; the stores keep their own error messages.
    pub async fn load(&self) -> Result<DashboardSummary> {
        let (bookings, rooms, reviews, users) = futures::join!(
            self.bookings.fetch_bookings(),
            self.rooms.fetch_catalog(),
            self.reviews.fetch_reviews(),
            self.users.fetch_users(),
        );
        bookings?;
        let rooms = rooms?;
        reviews?;
        users?;

        let bookings = self.bookings.snapshot();
        Ok(DashboardSummary::compute(
            &bookings.bookings,
            bookings.total,
            &rooms,
            &self.reviews.snapshot().reviews,
            self.users.snapshot().total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::MockServer;
    use reqwest::Method;
    use serde_json::json;

    fn review(rating: u8) -> Review {
        serde_json::from_value(json!({"id": 1, "rating": rating})).unwrap()
    }

    #[test]
    fn test_average_rating_rounds_to_one_decimal() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review(5), review(4), review(4)]), 4.3);
        assert_eq!(average_rating(&[review(1), review(2)]), 1.5);
    }

    #[tokio::test]
    async fn test_load_summarises_all_listings() {
        let server = MockServer::new();
        server.respond(
            Method::GET,
            "/bookings",
            json!({"bookings": [
                {"id": 1, "roomType": {"id": 1, "type": "Standard"}, "checkIn": "2024-06-01T00:00:00Z",
                 "checkOut": "2024-06-03T00:00:00Z", "nights": 2, "roomPrice": 100.0,
                 "totalPrice": 200.0, "status": "confirmed"},
                {"id": 2, "roomType": {"id": 1, "type": "Standard"}, "checkIn": "2024-06-05T00:00:00Z",
                 "checkOut": "2024-06-06T00:00:00Z", "nights": 1, "roomPrice": 100.0,
                 "totalPrice": 100.0, "status": "pending"}
            ], "total": 2}),
        );
        server.respond(
            Method::GET,
            "/rooms",
            json!({"roomTypes": [
                {"id": 1, "type": "Standard", "price": 100.0, "quantity": 10},
                {"id": 2, "type": "Deluxe", "price": 180.0, "quantity": 4}
            ], "total": 2}),
        );
        server.respond(
            Method::GET,
            "/reviews/admin/all",
            json!([{"id": 1, "rating": 5}, {"id": 2, "rating": 4}]),
        );
        server.respond(Method::GET, "/users", json!({"users": [], "total": 37}));

        let api = server.api();
        let dashboard = Dashboard::new(
            Arc::new(BookingStore::new(api.clone())),
            Arc::new(RoomStore::new(api.clone())),
            Arc::new(ReviewStore::new(api.clone())),
            Arc::new(UserStore::new(api)),
        );
        let summary = dashboard.load().await.unwrap();

        assert_eq!(summary.total_revenue, 200.0);
        assert_eq!(summary.total_bookings, 2);
        assert_eq!(summary.total_users, 37);
        assert_eq!(summary.total_rooms, 14);
        assert_eq!(summary.average_rating, 4.5);
        assert_eq!(summary.inventory.len(), 2);
        assert_eq!(summary.revenue_by_room_type.len(), 1);
    }

    #[tokio::test]
    async fn test_load_reports_failure() {
        let server = MockServer::new();
        server.fail(Method::GET, "/users", 403, "Admin access required");
        let api = server.api();
        let users = Arc::new(UserStore::new(api.clone()));
        let dashboard = Dashboard::new(
            Arc::new(BookingStore::new(api.clone())),
            Arc::new(RoomStore::new(api.clone())),
            Arc::new(ReviewStore::new(api)),
            users.clone(),
        );

        assert!(dashboard.load().await.is_err());
        assert_eq!(
            users.snapshot().status.error.as_deref(),
            Some("Admin access required")
        );
    }
}
