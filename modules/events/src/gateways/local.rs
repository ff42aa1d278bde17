use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::EventsApi,
    error::EventsError,
    model::{Event, EventFilter, NewEvent, NewProfile, Tag, UserProfile},
};
use crate::domain::service::Service;

/// Local implementation of the EventsApi trait that delegates to the domain service
pub struct EventsLocalClient {
    service: Arc<Service>,
}

impl EventsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventsApi for EventsLocalClient {
    async fn get_event(&self, id: Uuid) -> Result<Event, EventsError> {
        self.service.get_event(id).await.map_err(Into::into)
    }

    async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, EventsError> {
        self.service.list_events(filter).await.map_err(Into::into)
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<Event, EventsError> {
        self.service.create_event(new_event).await.map_err(Into::into)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, EventsError> {
        self.service.list_tags().await.map_err(Into::into)
    }

    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile, EventsError> {
        self.service
            .create_profile(new_profile)
            .await
            .map_err(Into::into)
    }

    async fn get_profile(&self, user_ref: &str) -> Result<UserProfile, EventsError> {
        self.service.get_profile(user_ref).await.map_err(Into::into)
    }

    async fn add_profile_tags(
        &self,
        user_ref: &str,
        tags: Vec<String>,
    ) -> Result<UserProfile, EventsError> {
        self.service
            .add_profile_tags(user_ref, &tags)
            .await
            .map_err(Into::into)
    }

    async fn remove_profile_tags(
        &self,
        user_ref: &str,
        tags: Vec<String>,
    ) -> Result<UserProfile, EventsError> {
        self.service
            .remove_profile_tags(user_ref, &tags)
            .await
            .map_err(Into::into)
    }
}
