// In-memory stand-in for the booking API used by unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;

use crate::api::{ApiRequest, BookingApi, Transport};
use crate::error::ApiError;

type RouteKey = (Method, String);

#[derive(Default)]
pub struct MockServer {
    // one-shot responses are consumed first, then the sticky one is replayed
    once: Mutex<HashMap<RouteKey, VecDeque<Result<Value, ApiError>>>>,
    sticky: Mutex<HashMap<RouteKey, Result<Value, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    token: Mutex<Option<String>>,
}

impl MockServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.sticky
            .lock()
            .insert((method, path.to_string()), Ok(body));
    }

    pub fn respond_once(&self, method: Method, path: &str, result: Result<Value, ApiError>) {
        self.once
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(result);
    }

    pub fn fail(&self, method: Method, path: &str, status_code: u16, message: &str) {
        self.sticky.lock().insert(
            (method, path.to_string()),
            Err(ApiError::ApiResponseError {
                status_code,
                message: message.to_string(),
            }),
        );
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    pub fn api(self: &Arc<Self>) -> BookingApi {
        BookingApi::new(self.clone())
    }
}

#[async_trait]
impl Transport for MockServer {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().push(request);

        if let Some(result) = self.once.lock().get_mut(&key).and_then(VecDeque::pop_front) {
            return result;
        }
        let sticky = self.sticky.lock().get(&key).cloned();
        sticky.unwrap_or_else(|| {
            Err(ApiError::ApiResponseError {
                status_code: 404,
                message: format!("no mock route for {} {}", key.0, key.1),
            })
        })
    }

    fn set_bearer_token(&self, token: Option<String>) {
        *self.token.lock() = token;
    }
}
