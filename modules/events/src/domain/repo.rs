use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::contract::model::{EmailPreference, Event, EventFilter, Tag, UserProfile, UserType};

/// Validated event row; the service has already generated the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    pub town: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub photo: Option<String>,
}

/// Validated profile row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_ref: String,
    pub user_type: UserType,
    pub primary_city: String,
    pub email_preference: EmailPreference,
}

/// Outcome of an insert guarded by a unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<T> {
    Created(T),
    Duplicate,
}

/// Port for canonical tag rows. Names passed in are already normalized.
#[async_trait]
pub trait TagsRepository: Send + Sync {
    /// Get-or-create every name; result is ordered by name.
    async fn get_or_create(&self, names: &[String]) -> anyhow::Result<Vec<Tag>>;
    async fn list(&self) -> anyhow::Result<Vec<Tag>>;
}

/// Port for event persistence.
#[async_trait]
pub trait EventsRepository: Send + Sync {
    /// Resolve tags, insert the event and its links as one atomic unit.
    async fn insert_with_tags(
        &self,
        event: EventRecord,
        tag_names: &[String],
    ) -> anyhow::Result<Event>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Event>>;
    /// Date descending, then id. The filter is already normalized
    /// (lowercased towns, normalized tag names).
    async fn list(&self, filter: &EventFilter) -> anyhow::Result<Vec<Event>>;
}

/// Port for profile persistence.
///
/// Tag operations return `None` when no profile exists for `user_ref`.
#[async_trait]
pub trait ProfilesRepository: Send + Sync {
    async fn insert_with_tags(
        &self,
        profile: ProfileRecord,
        tag_names: &[String],
    ) -> anyhow::Result<Inserted<UserProfile>>;
    async fn find_by_user_ref(&self, user_ref: &str) -> anyhow::Result<Option<UserProfile>>;
    async fn link_tags(
        &self,
        user_ref: &str,
        tag_names: &[String],
    ) -> anyhow::Result<Option<UserProfile>>;
    async fn unlink_tags(
        &self,
        user_ref: &str,
        tag_names: &[String],
    ) -> anyhow::Result<Option<UserProfile>>;
}
