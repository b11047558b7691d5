// Availability window computation and the store holding the last fetched calendar

use chrono::{Days, NaiveDate};
use parking_lot::RwLock;
use tracing::{error, info};

use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::{AvailabilityCalendar, AvailabilityEntry};

/// Every calendar day from `start` to `end`, both ends included.
pub fn dates_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .collect()
}

/// The nights of a stay: `[check_in, check_out)`. The check-out day itself
/// needs no room.
pub fn stay_dates(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    match check_out.checked_sub_days(Days::new(1)) {
        Some(last_night) if check_in < check_out => dates_in_range(check_in, last_night),
        _ => Vec::new(),
    }
}

/// Names of the room types with inventory left on every one of `dates`.
///
/// A day with no entry in the calendar counts as sold out. An empty date
/// list selects nothing.
pub fn eligible_room_types(calendar: &AvailabilityCalendar, dates: &[NaiveDate]) -> Vec<String> {
    if dates.is_empty() {
        return Vec::new();
    }

    calendar
        .room_types()
        .filter(|room_type| {
            dates.iter().all(|date| {
                calendar
                    .entry(room_type, *date)
                    .map_or(false, |entry| entry.is_available())
            })
        })
        .map(str::to_string)
        .collect()
}

/// Smallest `available` count for `room_type` over `dates`; a missing day
/// counts as zero. `None` when the room type is absent or `dates` is empty.
pub fn min_availability(
    calendar: &AvailabilityCalendar,
    room_type: &str,
    dates: &[NaiveDate],
) -> Option<i64> {
    let days = calendar.days(room_type)?;
    dates
        .iter()
        .map(|date| days.get(date).map_or(0, |entry| entry.available))
        .min()
}

// Read-only copy of the store state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilitySnapshot {
    pub calendar: AvailabilityCalendar,
    pub window: Option<(NaiveDate, NaiveDate)>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct AvailabilityStore {
    api: BookingApi,
    state: RwLock<AvailabilitySnapshot>,
}

impl AvailabilityStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(AvailabilitySnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> AvailabilitySnapshot {
        self.state.read().clone()
    }

    /// Fetch the calendar for `[start, end]` and replace whatever window was
    /// held before. On failure the previous calendar is left in place and the
    /// error message is recorded.
    pub async fn fetch_availability_calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AvailabilityCalendar> {
        if start > end {
            return Err(Error::InvalidDates);
        }

        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        match self.api.availability_calendar(start, end).await {
            Ok(calendar) => {
                info!(%start, %end, room_types = calendar.0.len(), "availability calendar loaded");
                let mut state = self.state.write();
                state.calendar = calendar.clone();
                state.window = Some((start, end));
                state.loading = false;
                Ok(calendar)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(%start, %end, error = %e, "fetch availability calendar failed");
                let mut state = self.state.write();
                state.error = Some(e.user_message("Failed to fetch calendar"));
                state.loading = false;
                Err(e)
            }
        }
    }

    /// Entry for one room type on one day, or `None` when the day is outside
    /// the last fetched window or the room type is unknown.
    pub fn availability_for(&self, room_type: &str, date: NaiveDate) -> Option<AvailabilityEntry> {
        let state = self.state.read();
        let (start, end) = state.window?;
        if date < start || date > end {
            return None;
        }
        state.calendar.entry(room_type, date)
    }

    pub fn clear_error(&self) {
        self.state.write().error = None;
    }
}
