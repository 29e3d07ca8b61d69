use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::ContentKind;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Missing, malformed, expired or forged credential. Never says which.
    #[error("Invalid credential")]
    InvalidCredential,

    /// Unknown email or wrong password. Never says which.
    #[error("Invalid email or password")]
    InvalidLogin,

    #[error("Not allowed to {action}")]
    Forbidden { action: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Email '{email}' is already registered")]
    EmailAlreadyExists { email: String },

    #[error("Already registered for this event")]
    AlreadyRegistered,

    #[error("Event is full ({limit} places)")]
    CapacityExceeded { limit: u32 },

    #[error("Event has already taken place")]
    EventClosed,

    #[error("Not registered for this event")]
    NotRegistered,

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    pub fn content_not_found(kind: ContentKind, id: Uuid) -> Self {
        Self::NotFound {
            kind: kind.as_str(),
            id,
        }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "user", id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
