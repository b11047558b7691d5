// Data structures exchanged with the booking API

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// A bookable category of room, not an individual physical room
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub id: i64,
    #[serde(rename = "type")]
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct AvailabilityEntry {
    pub available: i64,
    pub booked: i64,
}

impl AvailabilityEntry {
    pub fn is_available(&self) -> bool {
        self.available > 0
    }
}

// Room type name -> date -> entry, scoped to the queried window
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AvailabilityCalendar(pub BTreeMap<String, BTreeMap<NaiveDate, AvailabilityEntry>>);

impl AvailabilityCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, room_type: &str, date: NaiveDate, entry: AvailabilityEntry) {
        self.0
            .entry(room_type.to_string())
            .or_default()
            .insert(date, entry);
    }

    pub fn entry(&self, room_type: &str, date: NaiveDate) -> Option<AvailabilityEntry> {
        self.0.get(room_type).and_then(|days| days.get(&date)).copied()
    }

    pub fn room_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn days(&self, room_type: &str) -> Option<&BTreeMap<NaiveDate, AvailabilityEntry>> {
        self.0.get(room_type)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    // Guests may only cancel their own pending bookings; admins may confirm
    // or cancel pending ones. Nothing leaves confirmed or cancelled.
    pub fn can_transition_to(&self, next: BookingStatus, actor: Actor) -> bool {
        match (self, next, actor) {
            (BookingStatus::Pending, BookingStatus::Cancelled, _) => true,
            (BookingStatus::Pending, BookingStatus::Confirmed, Actor::Admin) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

// Who is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub room_type_id: Option<i64>,
    #[serde(default)]
    pub room_type: Option<RoomTypeSummary>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    #[serde(default)]
    pub nights: i64,
    #[serde(default)]
    pub room_price: f64,
    #[serde(default)]
    pub total_price: f64,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn room_type_name(&self) -> &str {
        self.room_type
            .as_ref()
            .map(|rt| rt.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn resolved_room_type_id(&self) -> Option<i64> {
        self.room_type_id
            .or_else(|| self.room_type.as_ref().map(|rt| rt.id))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub room_type_id: Option<i64>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub room_type: Option<RoomTypeSummary>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_visible() -> bool {
    true
}

impl Review {
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("Unknown")
    }

    pub fn room_type_name(&self) -> &str {
        self.room_type
            .as_ref()
            .map(|rt| rt.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn resolved_room_type_id(&self) -> Option<i64> {
        self.room_type
            .as_ref()
            .map(|rt| rt.id)
            .or(self.room_type_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dining {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingEvent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl MeetingEvent {
    // "business_meeting" -> "business meeting"
    pub fn event_type_label(&self) -> String {
        self.event_type.replace('_', " ")
    }
}

// Authenticated user plus the opaque token issued by the auth service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

// Request bodies

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_type_id: i64,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityUpdate {
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}
