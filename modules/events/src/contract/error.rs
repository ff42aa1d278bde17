use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventsError {
    #[error("Event not found: {id}")]
    EventNotFound { id: Uuid },

    #[error("Profile not found for user '{user_ref}'")]
    ProfileNotFound { user_ref: String },

    #[error("Profile for user '{user_ref}' already exists")]
    ProfileAlreadyExists { user_ref: String },

    /// Field name -> messages.
    #[error("Validation error")]
    Validation { errors: BTreeMap<String, Vec<String>> },

    #[error("Internal error")]
    Internal,
}

impl EventsError {
    pub fn event_not_found(id: Uuid) -> Self {
        Self::EventNotFound { id }
    }

    pub fn profile_not_found(user_ref: impl Into<String>) -> Self {
        Self::ProfileNotFound {
            user_ref: user_ref.into(),
        }
    }

    pub fn profile_already_exists(user_ref: impl Into<String>) -> Self {
        Self::ProfileAlreadyExists {
            user_ref: user_ref.into(),
        }
    }

    pub fn validation(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self::Validation { errors }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for EventsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            EventNotFound { id } => Self::event_not_found(id),
            ProfileNotFound { user_ref } => Self::profile_not_found(user_ref),
            ProfileAlreadyExists { user_ref } => Self::profile_already_exists(user_ref),
            Validation { errors } => Self::validation(errors),
            Database { .. } => Self::internal(),
        }
    }
}
