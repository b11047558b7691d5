// Declarative payload schemas, checked before anything is sent to the API

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::models::Role;

// First error message per field, ordered by field name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut first = BTreeMap::new();
        for (field, field_errors) in errors.field_errors() {
            if let Some(error) = field_errors.first() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                first.insert(field.to_string(), message);
            }
        }
        FieldErrors(first)
    }
}

pub fn validate_form<T: Validate>(form: &T) -> Result<(), FieldErrors> {
    form.validate().map_err(FieldErrors::from)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomForm {
    #[serde(rename = "type")]
    #[validate(length(min = 3, message = "Type must be at least 3 characters"))]
    pub name: String,
    #[validate(range(min = 0.01, message = "Price must be greater than 0"))]
    pub price: f64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
pub struct DiningForm {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeetingEventForm {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: u32,
    #[validate(length(min = 1, message = "Event type is required"))]
    pub event_type: String,
    pub images: Vec<String>,
}

// Admin creates a user, role included
#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
pub struct NewUserForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
}

// Self-service edit; a blank password means "keep the current one"
#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
pub struct AccountForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl AccountForm {
    pub fn normalized(mut self) -> Self {
        if self.password.as_deref().map_or(false, |p| p.is_empty()) {
            self.password = None;
        }
        self
    }
}

// Admin edit of another user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
pub struct UserUpdateForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewForm {
    pub room_type_id: i64,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn valid_room() -> RoomForm {
        RoomForm {
            name: "Deluxe".to_string(),
            price: 120.0,
            quantity: 4,
            description: "Sea view with balcony".to_string(),
            images: vec![],
        }
    }

    #[test]
    fn test_valid_room_passes() {
        assert!(validate_form(&valid_room()).is_ok());
    }

    #[test]
    fn test_room_reports_each_bad_field_once() {
        let form = RoomForm {
            name: "Dx".to_string(),
            price: 0.0,
            quantity: 0,
            description: "short".to_string(),
            images: vec![],
        };
        let errors = validate_form(&form).unwrap_err();
        assert_eq!(errors.len(), 4);
        // keyed by the wire name when the derive honours the serde rename
        assert_eq!(
            errors.get("name").or_else(|| errors.get("type")),
            Some("Type must be at least 3 characters")
        );
        assert_eq!(errors.get("price"), Some("Price must be greater than 0"));
        assert_eq!(errors.get("quantity"), Some("Quantity must be at least 1"));
    }

    #[test_case("", "bob@example.com", "secret1", Some("name"); "short name")]
    #[test_case("Bob", "not-an-email", "secret1", Some("email"); "bad email")]
    #[test_case("Bob", "bob@example.com", "123", Some("password"); "short password")]
    #[test_case("Bob", "bob@example.com", "secret1", None; "valid user")]
    fn test_new_user_form(name: &str, email: &str, password: &str, bad_field: Option<&str>) {
        let form = NewUserForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::User,
        };
        match (validate_form(&form), bad_field) {
            (Ok(()), None) => {}
            (Err(errors), Some(field)) => assert!(errors.get(field).is_some(), "{}", errors),
            (result, expected) => panic!("unexpected {:?} for {:?}", result, expected),
        }
    }

    #[test]
    fn test_blank_password_is_dropped_from_account_update() {
        let form = AccountForm {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: Some(String::new()),
        }
        .normalized();
        assert!(validate_form(&form).is_ok());

        let body = serde_json::to_value(&form).unwrap();
        assert!(body.get("password").is_none());
    }

    #[test]
    fn test_review_rating_bounds() {
        let mut form = ReviewForm {
            room_type_id: 1,
            rating: 6,
            comment: "Lovely".to_string(),
        };
        assert!(validate_form(&form).is_err());
        form.rating = 5;
        assert!(validate_form(&form).is_ok());
        form.rating = 0;
        assert_eq!(
            validate_form(&form).unwrap_err().get("rating"),
            Some("Rating must be between 1 and 5")
        );
    }

    #[test]
    fn test_room_form_serializes_type_key() {
        let body = serde_json::to_value(valid_room()).unwrap();
        assert_eq!(body["type"], "Deluxe");
        assert_eq!(body["quantity"], 4);
    }
}
