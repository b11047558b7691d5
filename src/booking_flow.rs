// Guest booking flow: pick dates, check availability, pick a room, submit
//
// Phases:
//   NoDatesSelected -> DatesSelected -> AvailabilityChecked -> RoomSelected
//     -> Submitting -> Success | Failed
// Changing either date drops back to DatesSelected and forgets the results
// and the selected room. Failed keeps the selection so the guest can retry.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::availability::{eligible_room_types, min_availability, stay_dates, AvailabilityStore};
use crate::error::{Error, Result};
use crate::models::{Booking, CreateBookingRequest, RoomType};
use crate::stores::{AuthStore, BookingStore, RoomStore};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum FlowPhase {
    NoDatesSelected,
    DatesSelected,
    AvailabilityChecked,
    RoomSelected,
    Submitting,
    Success(Booking),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityOutcome {
    Found(usize),
    // not an error: the dates are valid, the hotel is just full
    NoRooms,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub available_rooms: Vec<RoomType>,
    pub selected_room: Option<RoomType>,
    pub min_available: Option<i64>,
    pub error: Option<String>,
    pub phase: FlowPhase,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            check_in: None,
            check_out: None,
            available_rooms: Vec::new(),
            selected_room: None,
            min_available: None,
            error: None,
            phase: FlowPhase::NoDatesSelected,
        }
    }
}

impl FlowState {
    fn dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.check_in?, self.check_out?))
    }

    fn clear_results(&mut self) {
        self.available_rooms.clear();
        self.selected_room = None;
        self.min_available = None;
        self.error = None;
        self.phase = FlowPhase::DatesSelected;
    }
}

/// Whole nights between two instants: the millisecond gap divided by one
/// day, rounded up. Rounding up absorbs the hour lost or gained across a
/// daylight-saving change.
pub fn nights(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    let ms = (check_out - check_in).num_milliseconds().abs();
    (ms + DAY_MS - 1) / DAY_MS
}

// Dates are submitted as midnight UTC instants
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

pub struct BookingFlow {
    rooms: Arc<RoomStore>,
    availability: Arc<AvailabilityStore>,
    bookings: Arc<BookingStore>,
    auth: Arc<AuthStore>,
    state: RwLock<FlowState>,
}

impl BookingFlow {
    pub fn new(
        rooms: Arc<RoomStore>,
        availability: Arc<AvailabilityStore>,
        bookings: Arc<BookingStore>,
        auth: Arc<AuthStore>,
    ) -> Self {
        Self {
            rooms,
            availability,
            bookings,
            auth,
            state: RwLock::new(FlowState::default()),
        }
    }

    pub fn snapshot(&self) -> FlowState {
        self.state.read().clone()
    }

    pub fn phase(&self) -> FlowPhase {
        self.state.read().phase.clone()
    }

    pub fn set_check_in(&self, date: NaiveDate) {
        let mut state = self.state.write();
        state.check_in = Some(date);
        state.clear_results();
    }

    pub fn set_check_out(&self, date: NaiveDate) {
        let mut state = self.state.write();
        state.check_out = Some(date);
        state.clear_results();
    }

    pub fn reset(&self) {
        *self.state.write() = FlowState::default();
    }

    // Both dates set and check-out strictly after check-in
    pub fn can_check_availability(&self) -> bool {
        matches!(self.state.read().dates(), Some((check_in, check_out)) if check_in < check_out)
    }

    /// Fetch the calendar for the chosen dates and keep the room types that
    /// have inventory on every night of the stay. The check-out day is not a
    /// night, so a room sold out on that date is still offered.
    pub async fn check_availability(&self) -> Result<AvailabilityOutcome> {
        let (check_in, check_out) = match self.state.read().dates() {
            Some((check_in, check_out)) if check_in < check_out => (check_in, check_out),
            _ => return Err(Error::InvalidDates),
        };

        let mut catalog = self.rooms.snapshot().catalog;
        if catalog.is_empty() {
            catalog = match self.rooms.fetch_catalog().await {
                Ok(catalog) => catalog,
                Err(e) => {
                    self.state.write().error = Some(e.user_message("Failed to fetch rooms"));
                    return Err(e);
                }
            };
        }

        let calendar = match self
            .availability
            .fetch_availability_calendar(check_in, check_out)
            .await
        {
            Ok(calendar) => calendar,
            Err(e) => {
                self.state.write().error = Some(e.user_message("Failed to fetch calendar"));
                return Err(e);
            }
        };

        let eligible = eligible_room_types(&calendar, &stay_dates(check_in, check_out));
        let available: Vec<RoomType> = catalog
            .into_iter()
            .filter(|room| eligible.iter().any(|name| *name == room.name))
            .collect();
        let outcome = if available.is_empty() {
            AvailabilityOutcome::NoRooms
        } else {
            AvailabilityOutcome::Found(available.len())
        };

        let mut state = self.state.write();
        if state.dates() != Some((check_in, check_out)) {
            debug!(%check_in, %check_out, "dates changed during availability check, dropping result");
            return Ok(outcome);
        }
        info!(%check_in, %check_out, available = available.len(), "availability checked");
        state.available_rooms = available;
        state.selected_room = None;
        state.min_available = None;
        state.error = None;
        state.phase = FlowPhase::AvailabilityChecked;
        Ok(outcome)
    }

    /// Select one of the rooms returned by the last availability check and
    /// work out how many are left on the tightest night.
    pub fn select_room(&self, room_type_id: i64) -> Result<RoomType> {
        let mut state = self.state.write();
        let room = state
            .available_rooms
            .iter()
            .find(|room| room.id == room_type_id)
            .cloned()
            .ok_or(Error::RoomNotAvailable(room_type_id))?;

        let (check_in, check_out) = state.dates().ok_or(Error::InvalidDates)?;
        let calendar = self.availability.snapshot().calendar;
        state.min_available =
            min_availability(&calendar, &room.name, &stay_dates(check_in, check_out));
        state.selected_room = Some(room.clone());
        state.error = None;
        state.phase = FlowPhase::RoomSelected;
        Ok(room)
    }

    // Rooms left on the tightest night of the stay, once a room is selected
    pub fn min_availability(&self) -> Option<i64> {
        self.state.read().min_available
    }

    pub fn nights(&self) -> Option<i64> {
        let (check_in, check_out) = self.state.read().dates()?;
        Some(nights(start_of_day(check_in), start_of_day(check_out)))
    }

    // Display only; the server prices the booking itself
    pub fn total_price(&self) -> Option<f64> {
        let nights = self.nights()?;
        let price = self.state.read().selected_room.as_ref()?.price;
        Some(price * nights as f64)
    }

    /// Send the booking. Needs a signed-in user and a selected room; a
    /// failed attempt can be retried with another call.
    pub async fn submit(&self) -> Result<Booking> {
        self.auth.require_user()?;

        let request = {
            let mut state = self.state.write();
            match state.phase {
                FlowPhase::RoomSelected | FlowPhase::Failed(_) => {}
                FlowPhase::Submitting => return Err(Error::SubmitInProgress),
                _ => return Err(Error::NoRoomSelected),
            }
            let room = state.selected_room.as_ref().ok_or(Error::NoRoomSelected)?;
            let (check_in, check_out) = state.dates().ok_or(Error::InvalidDates)?;
            let request = CreateBookingRequest {
                room_type_id: room.id,
                check_in: start_of_day(check_in),
                check_out: start_of_day(check_out),
            };
            state.error = None;
            state.phase = FlowPhase::Submitting;
            request
        };

        match self.bookings.create_booking(&request).await {
            Ok(booking) => {
                self.state.write().phase = FlowPhase::Success(booking.clone());
                Ok(booking)
            }
            Err(e) => {
                let message = e.user_message("Failed to create booking");
                warn!(room_type_id = request.room_type_id, error = %e, "booking submission failed");
                let mut state = self.state.write();
                state.error = Some(message.clone());
                state.phase = FlowPhase::Failed(message);
                Err(e)
            }
        }
    }
}
