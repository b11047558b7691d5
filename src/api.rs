// HTTP client adapter for the booking API
//
// `Transport` is the seam: it moves one JSON request/response pair and maps
// failures into `ApiError`. `BookingApi` layers the typed endpoints on top,
// so stores never see URLs or wire wrappers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::models::{
    AvailabilityCalendar, Booking, BookingStatus, CreateBookingRequest, Dining, LoginRequest,
    MeetingEvent, RegisterResponse, Review, Role, RoleUpdate, RoomType, Session, StatusUpdate,
    User, VisibilityUpdate,
};
use crate::pagination::{ListQuery, Page};
use crate::validation::{
    AccountForm, DiningForm, MeetingEventForm, NewUserForm, RegisterForm, ReviewForm, RoomForm,
    UserUpdateForm,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    // Send one request; non-2xx responses become `ApiError::ApiResponseError`
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError>;

    // Bearer token attached to every following request
    fn set_bearer_token(&self, token: Option<String>);

    fn stats(&self) -> ClientStats {
        ClientStats::default()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

impl ClientStats {
    fn record(&mut self, elapsed: Duration, success: bool) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.requests_sent += 1;
        if success {
            self.requests_succeeded += 1;
        } else {
            self.requests_failed += 1;
        }
        let n = self.requests_sent as f64;
        self.average_response_time_ms = (self.average_response_time_ms * (n - 1.0) + ms) / n;
        self.max_response_time_ms = self.max_response_time_ms.max(ms);
    }
}

// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
    token: RwLock<Option<String>>,
    stats: Mutex<ClientStats>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(None),
            stats: Mutex::new(ClientStats::default()),
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms.unwrap_or_default())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.config.endpoint(&request.path);
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .query(&request.query);
        let token = self.token.read().clone();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let result: Result<Value, ApiError> = async {
            let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;

            if !status.is_success() {
                return Err(ApiError::ApiResponseError {
                    status_code: status.as_u16(),
                    message: extract_error_message(&bytes).unwrap_or_default(),
                });
            }
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
        }
        .await;

        let elapsed = started.elapsed();
        self.stats.lock().record(elapsed, result.is_ok());
        match &result {
            Ok(_) => debug!(method = %request.method, %url, ?elapsed, "request succeeded"),
            Err(e) => warn!(method = %request.method, %url, error = %e, "request failed"),
        }
        result
    }

    fn set_bearer_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }
}

// Error bodies are `{ message }`, except the meetings/events routes which use `{ error }`
pub fn extract_error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

// Filters for the admin review listing; empty values are not sent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewFilters {
    pub rating: Option<u8>,
    pub room_type_id: Option<i64>,
    pub is_visible: Option<bool>,
    pub search: String,
}

impl ReviewFilters {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(rating) = self.rating {
            params.push(("rating".to_string(), rating.to_string()));
        }
        if let Some(room_type_id) = self.room_type_id {
            params.push(("roomTypeId".to_string(), room_type_id.to_string()));
        }
        if let Some(is_visible) = self.is_visible {
            params.push(("isVisible".to_string(), is_visible.to_string()));
        }
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        params
    }
}

// Wire wrappers

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomList {
    room_types: Vec<RoomType>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct CreatedRoom {
    room: RoomType,
}

#[derive(Deserialize)]
struct UpdatedRoom {
    updated: RoomType,
}

#[derive(Deserialize)]
struct BookingList {
    bookings: Vec<Booking>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct UserList {
    users: Vec<User>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ReviewEnvelope {
    review: Review,
}

#[derive(Deserialize, Default)]
struct Pagination {
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

impl<T> From<DataList<T>> for Page<T> {
    fn from(list: DataList<T>) -> Self {
        Page {
            items: list.data,
            total: list.pagination.unwrap_or_default().total,
        }
    }
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

// Typed endpoints of the booking API
#[derive(Clone)]
pub struct BookingApi {
    transport: Arc<dyn Transport>,
}

impl BookingApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn http(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn set_token(&self, token: Option<String>) {
        self.transport.set_bearer_token(token);
    }

    pub fn stats(&self) -> ClientStats {
        self.transport.stats()
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let value = self.transport.execute(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn call_unit(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.transport.execute(request).await.map(|_| ())
    }

    fn with_body<B: Serialize>(request: ApiRequest, body: &B) -> Result<ApiRequest, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(request.body(value))
    }

    // Rooms

    pub async fn list_rooms(&self, query: &ListQuery) -> Result<Page<RoomType>, ApiError> {
        let list: RoomList = self
            .call(ApiRequest::new(Method::GET, "/rooms").query(query.to_params()))
            .await?;
        Ok(Page {
            items: list.room_types,
            total: list.total,
        })
    }

    pub async fn get_room(&self, id: i64) -> Result<RoomType, ApiError> {
        self.call(ApiRequest::new(Method::GET, format!("/rooms/{}", id)))
            .await
    }

    pub async fn create_room(&self, form: &RoomForm) -> Result<RoomType, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/rooms"), form)?;
        let created: CreatedRoom = self.call(request).await?;
        Ok(created.room)
    }

    pub async fn update_room(&self, id: i64, form: &RoomForm) -> Result<RoomType, ApiError> {
        let request =
            Self::with_body(ApiRequest::new(Method::PATCH, format!("/rooms/{}", id)), form)?;
        let updated: UpdatedRoom = self.call(request).await?;
        Ok(updated.updated)
    }

    pub async fn delete_room(&self, id: i64) -> Result<(), ApiError> {
        self.call_unit(ApiRequest::new(Method::DELETE, format!("/rooms/{}", id)))
            .await
    }

    pub async fn availability_calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AvailabilityCalendar, ApiError> {
        let query = vec![
            ("startDate".to_string(), start.format("%Y-%m-%d").to_string()),
            ("endDate".to_string(), end.format("%Y-%m-%d").to_string()),
        ];
        self.call(ApiRequest::new(Method::GET, "/rooms/availability-calendar").query(query))
            .await
    }

    // Bookings

    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/bookings"), request)?;
        self.call(request).await
    }

    pub async fn list_bookings(
        &self,
        query: &ListQuery,
        status: Option<BookingStatus>,
    ) -> Result<Page<Booking>, ApiError> {
        let mut params = query.to_params();
        if let Some(status) = status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        let list: BookingList = self
            .call(ApiRequest::new(Method::GET, "/bookings").query(params))
            .await?;
        Ok(Page {
            items: list.bookings,
            total: list.total,
        })
    }

    pub async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.call(ApiRequest::new(Method::GET, "/bookings/my")).await
    }

    pub async fn get_booking(&self, id: i64) -> Result<Booking, ApiError> {
        self.call(ApiRequest::new(Method::GET, format!("/bookings/{}", id)))
            .await
    }

    pub async fn update_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> Result<Booking, ApiError> {
        let request = Self::with_body(
            ApiRequest::new(Method::PATCH, format!("/bookings/{}/status", id)),
            &StatusUpdate { status },
        )?;
        self.call(request).await
    }

    pub async fn delete_booking(&self, id: i64) -> Result<(), ApiError> {
        self.call_unit(ApiRequest::new(Method::DELETE, format!("/bookings/{}", id)))
            .await
    }

    // Reviews

    pub async fn list_reviews(&self, filters: &ReviewFilters) -> Result<Vec<Review>, ApiError> {
        self.call(ApiRequest::new(Method::GET, "/reviews/admin/all").query(filters.to_params()))
            .await
    }

    pub async fn public_reviews(&self, room_type_id: Option<i64>) -> Result<Vec<Review>, ApiError> {
        let query = room_type_id
            .map(|id| vec![("roomTypeId".to_string(), id.to_string())])
            .unwrap_or_default();
        self.call(ApiRequest::new(Method::GET, "/reviews/public").query(query))
            .await
    }

    pub async fn create_review(&self, form: &ReviewForm) -> Result<Review, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/reviews"), form)?;
        self.call(request).await
    }

    pub async fn delete_review(&self, id: i64) -> Result<(), ApiError> {
        self.call_unit(ApiRequest::new(Method::DELETE, format!("/reviews/{}", id)))
            .await
    }

    pub async fn set_review_visibility(&self, id: i64, is_visible: bool) -> Result<Review, ApiError> {
        let request = Self::with_body(
            ApiRequest::new(Method::PATCH, format!("/reviews/{}/visibility", id)),
            &VisibilityUpdate { is_visible },
        )?;
        let envelope: ReviewEnvelope = self.call(request).await?;
        Ok(envelope.review)
    }

    // Users and auth

    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<User>, ApiError> {
        let list: UserList = self
            .call(ApiRequest::new(Method::GET, "/users").query(query.to_params()))
            .await?;
        Ok(Page {
            items: list.users,
            total: list.total,
        })
    }

    pub async fn create_user(&self, form: &NewUserForm) -> Result<User, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/users"), form)?;
        let envelope: UserEnvelope = self.call(request).await?;
        Ok(envelope.user)
    }

    pub async fn update_user(&self, id: i64, form: &UserUpdateForm) -> Result<User, ApiError> {
        let request =
            Self::with_body(ApiRequest::new(Method::PATCH, format!("/users/{}", id)), form)?;
        let envelope: UserEnvelope = self.call(request).await?;
        Ok(envelope.user)
    }

    pub async fn update_user_role(&self, id: i64, role: Role) -> Result<(), ApiError> {
        let request = Self::with_body(
            ApiRequest::new(Method::PUT, format!("/users/{}", id)),
            &RoleUpdate { role },
        )?;
        self.call_unit(request).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.call_unit(ApiRequest::new(Method::DELETE, format!("/users/{}", id)))
            .await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self.call(ApiRequest::new(Method::GET, "/auth/me")).await?;
        Ok(envelope.user)
    }

    pub async fn update_current_user(&self, form: &AccountForm) -> Result<User, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::PATCH, "/auth/me"), form)?;
        let envelope: UserEnvelope = self.call(request).await?;
        Ok(envelope.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let request = Self::with_body(
            ApiRequest::new(Method::POST, "/auth/login"),
            &LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        self.call(request).await
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/auth/register"), form)?;
        self.call(request).await
    }

    // Dining

    pub async fn list_dinings(&self, query: &ListQuery) -> Result<Page<Dining>, ApiError> {
        let list: DataList<Dining> = self
            .call(ApiRequest::new(Method::GET, "/dinings").query(query.to_params()))
            .await?;
        Ok(list.into())
    }

    pub async fn get_dining(&self, id: i64) -> Result<Dining, ApiError> {
        self.call(ApiRequest::new(Method::GET, format!("/dinings/{}", id)))
            .await
    }

    pub async fn create_dining(&self, form: &DiningForm) -> Result<Dining, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/dinings"), form)?;
        self.call(request).await
    }

    pub async fn update_dining(&self, id: i64, form: &DiningForm) -> Result<Dining, ApiError> {
        let request =
            Self::with_body(ApiRequest::new(Method::PUT, format!("/dinings/{}", id)), form)?;
        self.call(request).await
    }

    pub async fn delete_dining(&self, id: i64) -> Result<(), ApiError> {
        self.call_unit(ApiRequest::new(Method::DELETE, format!("/dinings/{}", id)))
            .await
    }

    // Meetings and events

    pub async fn list_meetings_events(
        &self,
        query: &ListQuery,
    ) -> Result<Page<MeetingEvent>, ApiError> {
        let list: DataList<MeetingEvent> = self
            .call(ApiRequest::new(Method::GET, "/meetings-and-events").query(query.to_params()))
            .await?;
        Ok(list.into())
    }

    pub async fn create_meeting_event(
        &self,
        form: &MeetingEventForm,
    ) -> Result<MeetingEvent, ApiError> {
        let request = Self::with_body(ApiRequest::new(Method::POST, "/meetings-and-events"), form)?;
        let envelope: DataEnvelope<MeetingEvent> = self.call(request).await?;
        Ok(envelope.data)
    }

    pub async fn update_meeting_event(
        &self,
        id: i64,
        form: &MeetingEventForm,
    ) -> Result<MeetingEvent, ApiError> {
        let request = Self::with_body(
            ApiRequest::new(Method::PUT, format!("/meetings-and-events/{}", id)),
            form,
        )?;
        let envelope: DataEnvelope<MeetingEvent> = self.call(request).await?;
        Ok(envelope.data)
    }

    pub async fn delete_meeting_event(&self, id: i64) -> Result<(), ApiError> {
        self.call_unit(ApiRequest::new(
            Method::DELETE,
            format!("/meetings-and-events/{}", id),
        ))
        .await
    }
}
