use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

/// Field name -> human readable problems, ordered by field for stable output.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Event not found: {id}")]
    EventNotFound { id: Uuid },

    #[error("Profile not found for user '{user_ref}'")]
    ProfileNotFound { user_ref: String },

    #[error("Profile for user '{user_ref}' already exists")]
    ProfileAlreadyExists { user_ref: String },

    #[error("Validation failed: {}", summarize(.errors))]
    Validation { errors: FieldErrors },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
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

    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// Append a problem for `field`, skipping exact duplicates.
pub fn push_field_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    let message = message.into();
    let entry = errors.entry(field.to_string()).or_default();
    if !entry.contains(&message) {
        entry.push(message);
    }
}

/// Fold another error map into `errors`.
pub fn merge_field_errors(errors: &mut FieldErrors, other: FieldErrors) {
    for (field, messages) in other {
        for message in messages {
            push_field_error(errors, &field, message);
        }
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}
