use thiserror::Error;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Errors that are safe to expose to other modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CampusError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: Uuid },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// Registration state or uniqueness conflicts.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error")]
    Internal,
}

impl From<DomainError> for CampusError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidCredential | DomainError::InvalidLogin => Self::Unauthenticated,
            DomainError::Forbidden { .. } => Self::Forbidden {
                message: e.to_string(),
            },
            DomainError::NotFound { kind, id } => Self::NotFound {
                kind: kind.to_string(),
                id,
            },
            DomainError::Validation { field, message } => Self::Validation { field, message },
            DomainError::EmailAlreadyExists { .. }
            | DomainError::AlreadyRegistered
            | DomainError::CapacityExceeded { .. }
            | DomainError::EventClosed
            | DomainError::NotRegistered => Self::Conflict {
                message: e.to_string(),
            },
            DomainError::Database { .. } => Self::Internal,
        }
    }
}
