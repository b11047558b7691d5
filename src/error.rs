// Error types shared by the transport, the stores and the booking flow

use thiserror::Error;

use crate::models::BookingStatus;
use crate::validation::FieldErrors;

pub type Result<T> = std::result::Result<T, Error>;

// Errors raised while talking to the booking API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    // Message the server put in the error body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::ApiResponseError { message, .. } if !message.trim().is_empty() => {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::ApiResponseError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

// Crate level error returned by stores and the booking flow
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Check-out date must be after check-in date")]
    InvalidDates,

    #[error("Booking cannot move from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Please login to continue")]
    NotAuthenticated,

    #[error("Administrator role required")]
    Forbidden,

    #[error("Reviews can only be left for confirmed stays that have checked out")]
    ReviewNotAllowed,

    #[error("No room selected")]
    NoRoomSelected,

    #[error("A booking is already being submitted")]
    SubmitInProgress,

    #[error("Room type {0} is not in the available set")]
    RoomNotAvailable(i64),

    #[error("Booking {0} not found")]
    BookingNotFound(i64),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    // String a store records in its `error` field: the server's message
    // verbatim, the local reason for client-side rejections, the fallback otherwise
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Api(api) => api
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            Error::Io(_) | Error::Json(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Error::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_body() {
        let err = Error::Api(ApiError::ApiResponseError {
            status_code: 409,
            message: "No rooms left".to_string(),
        });
        assert_eq!(err.user_message("Failed to create booking"), "No rooms left");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = Error::Api(ApiError::NetworkError("connection refused".to_string()));
        assert_eq!(
            err.user_message("Failed to create booking"),
            "Failed to create booking"
        );

        let blank = Error::Api(ApiError::ApiResponseError {
            status_code: 500,
            message: "  ".to_string(),
        });
        assert_eq!(blank.user_message("Failed"), "Failed");
    }

    #[test]
    fn test_user_message_for_local_rejection() {
        let err = Error::InvalidTransition {
            from: BookingStatus::Confirmed,
            to: BookingStatus::Cancelled,
        };
        assert_eq!(
            err.user_message("Failed"),
            "Booking cannot move from confirmed to cancelled"
        );
    }
}
