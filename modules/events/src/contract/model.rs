use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Canonical, normalized label shared by events and profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Event as stored, with its tag names sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub town: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub description: String,
    /// Two decimal places when present.
    pub price: Option<Decimal>,
    /// Storage reference (relative path or absolute URL).
    pub photo: Option<String>,
    pub tag_names: Vec<String>,
}

/// Unvalidated input for creating an event.
///
/// Fields stay optional and textual so that every problem can be reported
/// at once, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub title: Option<String>,
    pub town: Option<String>,
    /// ISO-8601 date or date-time.
    pub date: Option<String>,
    pub venue: Option<String>,
    pub description: Option<String>,
    /// Decimal in textual form; `None` means "use the configured default".
    pub price: Option<String>,
    pub photo: Option<String>,
    /// Raw tag names, normalized on create.
    pub tags: Vec<String>,
}

/// Optional narrowing for event listings. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Any of these towns, compared case-insensitively.
    pub towns: Vec<String>,
    /// At least one of these tags (raw names, normalized before matching).
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UserType {
    #[default]
    Local,
    Business,
    Venue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmailPreference {
    #[default]
    Weekly,
    Monthly,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Local => "LOCAL",
            UserType::Business => "BUSINESS",
            UserType::Venue => "VENUE",
        }
    }
}

impl FromStr for UserType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(UserType::Local),
            "BUSINESS" => Ok(UserType::Business),
            "VENUE" => Ok(UserType::Venue),
            _ => Err(UnknownVariant {
                kind: "user type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EmailPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailPreference::Weekly => "WEEKLY",
            EmailPreference::Monthly => "MONTHLY",
            EmailPreference::Never => "NEVER",
        }
    }
}

impl FromStr for EmailPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(EmailPreference::Weekly),
            "MONTHLY" => Ok(EmailPreference::Monthly),
            "NEVER" => Ok(EmailPreference::Never),
            _ => Err(UnknownVariant {
                kind: "email preference",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EmailPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user preferences, keyed by the identity subsystem's user reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_ref: String,
    pub user_type: UserType,
    pub primary_city: String,
    pub email_preference: EmailPreference,
    pub tag_names: Vec<String>,
}

/// Data for the profile-creation hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProfile {
    pub user_ref: String,
    pub user_type: Option<UserType>,
    pub primary_city: Option<String>,
    pub email_preference: Option<EmailPreference>,
    pub tags: Vec<String>,
}
