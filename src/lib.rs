// Client library for the hotel booking API: typed endpoints, per-entity
// stores, availability computation and the guest booking flow

pub mod api;
pub mod availability;
pub mod booking_flow;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod pagination;
pub mod stores;
pub mod telemetry;
pub mod validation;

#[cfg(test)]
pub mod mock_server;

// Re-export key types for convenience
pub use api::{BookingApi, ClientStats, HttpTransport, ReviewFilters, Transport};
pub use availability::{
    dates_in_range, eligible_room_types, min_availability, stay_dates, AvailabilityStore,
};
pub use booking_flow::{nights, AvailabilityOutcome, BookingFlow, FlowPhase};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardSummary};
pub use error::{ApiError, ClientError, Error, Result};
pub use models::{
    Actor, AvailabilityCalendar, AvailabilityEntry, Booking, BookingStatus, Review, Role,
    RoomType, Session, User,
};
pub use pagination::{ListQuery, Page};
pub use stores::{
    can_review_booking, AuthStore, BookingStore, DeleteConfirmation, DiningStore, LoadStatus,
    MeetingEventStore, PendingDelete, ReviewStore, RoomStore, UserStore,
};
