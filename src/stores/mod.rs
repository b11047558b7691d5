// Client-side state containers, one per entity
//
// Every store is constructed with the API it talks to, exposes async actions
// that own its state, and hands out cloned snapshots for rendering.

pub mod auth;
pub mod bookings;
pub mod dining;
pub mod meetings;
pub mod reviews;
pub mod rooms;
pub mod users;

use std::fmt;
use std::marker::PhantomData;

pub use auth::AuthStore;
pub use bookings::BookingStore;
pub use dining::DiningStore;
pub use meetings::MeetingEventStore;
pub use reviews::{can_review_booking, ReviewStore};
pub use rooms::RoomStore;
pub use users::UserStore;

// Loading flag and last error message carried by every store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl LoadStatus {
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self) {
        self.loading = false;
    }

    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

/// A delete the user has asked for but not yet confirmed.
///
/// Stores only accept a [`DeleteConfirmation`], and the only way to get one
/// is to call [`PendingDelete::confirm`].
#[derive(Debug)]
pub struct PendingDelete<T> {
    id: i64,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PendingDelete<T> {
    pub(crate) fn new(id: i64) -> Self {
        Self {
            id,
            _entity: PhantomData,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn confirm(self) -> DeleteConfirmation<T> {
        DeleteConfirmation {
            id: self.id,
            _entity: PhantomData,
        }
    }

    // Dropping works too; this just reads better at call sites
    pub fn cancel(self) {}
}

#[derive(Debug)]
pub struct DeleteConfirmation<T> {
    id: i64,
    _entity: PhantomData<fn() -> T>,
}

impl<T> DeleteConfirmation<T> {
    pub fn id(&self) -> i64 {
        self.id
    }
}

impl<T> fmt::Display for DeleteConfirmation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delete #{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomType;

    #[test]
    fn test_status_lifecycle() {
        let mut status = LoadStatus::default();
        status.fail("boom".to_string());
        status.start();
        assert!(status.loading);
        assert!(status.error.is_none());
        status.fail("Failed to fetch rooms".to_string());
        assert!(!status.loading);
        assert_eq!(status.error.as_deref(), Some("Failed to fetch rooms"));
    }

    #[test]
    fn test_confirmation_keeps_id() {
        let pending: PendingDelete<RoomType> = PendingDelete::new(42);
        assert_eq!(pending.id(), 42);
        let confirmed = pending.confirm();
        assert_eq!(confirmed.id(), 42);
        assert_eq!(confirmed.to_string(), "delete #42");
    }
}
