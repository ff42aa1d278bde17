use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::EventsError,
    model::{Event, EventFilter, NewEvent, NewProfile, Tag, UserProfile},
};

/// Public API of the events module for in-process consumers.
///
/// Profile operations are only reachable through this client; the identity
/// subsystem calls `create_profile` when an account is registered.
#[async_trait]
pub trait EventsApi: Send + Sync {
    /// Get an event by ID
    async fn get_event(&self, id: Uuid) -> Result<Event, EventsError>;

    /// List events, newest date first
    async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, EventsError>;

    /// Validate and create an event together with its tag links
    async fn create_event(&self, new_event: NewEvent) -> Result<Event, EventsError>;

    /// All known tags ordered by name
    async fn list_tags(&self) -> Result<Vec<Tag>, EventsError>;

    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile, EventsError>;

    async fn get_profile(&self, user_ref: &str) -> Result<UserProfile, EventsError>;

    async fn add_profile_tags(
        &self,
        user_ref: &str,
        tags: Vec<String>,
    ) -> Result<UserProfile, EventsError>;

    async fn remove_profile_tags(
        &self,
        user_ref: &str,
        tags: Vec<String>,
    ) -> Result<UserProfile, EventsError>;
}
