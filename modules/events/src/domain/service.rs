use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Event, EventFilter, NewEvent, NewProfile, Tag, UserProfile};
use crate::domain::error::DomainError;
use crate::domain::ports::PhotoUrlResolver;
use crate::domain::repo::{EventsRepository, Inserted, ProfilesRepository, TagsRepository};
use crate::domain::tags::{normalize_tag_name, normalize_tag_names, EmptyTagPolicy};
use crate::domain::validate::{town_key, validate_new_event, validate_new_profile};

/// Domain service for events, tags and profiles.
/// Depends only on the ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    events: Arc<dyn EventsRepository>,
    profiles: Arc<dyn ProfilesRepository>,
    tags: Arc<dyn TagsRepository>,
    photos: Arc<dyn PhotoUrlResolver>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub default_price: Option<Decimal>,
    pub empty_tag_policy: EmptyTagPolicy,
}

impl Service {
    pub fn new(
        events: Arc<dyn EventsRepository>,
        profiles: Arc<dyn ProfilesRepository>,
        tags: Arc<dyn TagsRepository>,
        photos: Arc<dyn PhotoUrlResolver>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            events,
            profiles,
            tags,
            photos,
            config,
        }
    }

    /// Retrievable URL for a stored photo reference.
    pub fn photo_url(&self, reference: &str) -> String {
        self.photos.resolve(reference)
    }

    // --- tags ---

    #[instrument(name = "events.service.resolve_tags", skip(self), fields(count = raw.len()))]
    pub async fn resolve_tags(&self, raw: &[String]) -> Result<Vec<Tag>, DomainError> {
        let names = normalize_tag_names(raw, self.config.empty_tag_policy)?;
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self
            .tags
            .get_or_create(&names)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        debug!("Resolved {} tags", tags.len());
        Ok(tags)
    }

    #[instrument(name = "events.service.list_tags", skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, DomainError> {
        self.tags
            .list()
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))
    }

    // --- events ---

    #[instrument(name = "events.service.get_event", skip(self), fields(event_id = %id))]
    pub async fn get_event(&self, id: Uuid) -> Result<Event, DomainError> {
        debug!("Getting event by id");
        let event = self
            .events
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::event_not_found(id))?;
        debug!("Successfully retrieved event");
        Ok(event)
    }

    #[instrument(
        name = "events.service.list_events",
        skip(self, filter),
        fields(towns = filter.towns.len(), tags = filter.tags.len())
    )]
    pub async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, DomainError> {
        let normalized = EventFilter {
            towns: filter
                .towns
                .iter()
                .map(|t| town_key(t))
                .filter(|t| !t.is_empty())
                .collect(),
            tags: filter
                .tags
                .iter()
                .map(|t| normalize_tag_name(t))
                .filter(|t| !t.is_empty())
                .collect(),
        };

        let events = self
            .events
            .list(&normalized)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        debug!("Listed {} events", events.len());
        Ok(events)
    }

    #[instrument(
        name = "events.service.create_event",
        skip(self, new_event),
        fields(title = new_event.title.as_deref().unwrap_or_default())
    )]
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event, DomainError> {
        info!("Creating new event");

        let id = Uuid::new_v4();
        let (record, tag_names) = validate_new_event(
            id,
            &new_event,
            self.config.default_price,
            self.config.empty_tag_policy,
        )
        .inspect_err(|e| warn!("Rejected event: {}", e))?;

        let event = self
            .events
            .insert_with_tags(record, &tag_names)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;

        info!(
            "Successfully created event with id={} and {} tags",
            event.id,
            event.tag_names.len()
        );
        Ok(event)
    }

    // --- profiles ---

    #[instrument(
        name = "events.service.create_profile",
        skip(self, new_profile),
        fields(user_ref = %new_profile.user_ref)
    )]
    pub async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile, DomainError> {
        info!("Creating profile");

        let (record, tag_names) =
            validate_new_profile(Uuid::new_v4(), &new_profile, self.config.empty_tag_policy)?;
        let user_ref = record.user_ref.clone();

        if self
            .profiles
            .find_by_user_ref(&user_ref)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .is_some()
        {
            return Err(DomainError::profile_already_exists(user_ref));
        }

        // The unique key still decides when two hooks race past the check above
        match self
            .profiles
            .insert_with_tags(record, &tag_names)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
        {
            Inserted::Created(profile) => {
                info!("Successfully created profile id={}", profile.id);
                Ok(profile)
            }
            Inserted::Duplicate => Err(DomainError::profile_already_exists(user_ref)),
        }
    }

    #[instrument(name = "events.service.get_profile", skip(self))]
    pub async fn get_profile(&self, user_ref: &str) -> Result<UserProfile, DomainError> {
        self.profiles
            .find_by_user_ref(user_ref)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::profile_not_found(user_ref))
    }

    #[instrument(name = "events.service.add_profile_tags", skip(self, raw), fields(count = raw.len()))]
    pub async fn add_profile_tags(
        &self,
        user_ref: &str,
        raw: &[String],
    ) -> Result<UserProfile, DomainError> {
        let names = normalize_tag_names(raw, self.config.empty_tag_policy)?;
        self.profiles
            .link_tags(user_ref, &names)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::profile_not_found(user_ref))
    }

    #[instrument(name = "events.service.remove_profile_tags", skip(self, raw), fields(count = raw.len()))]
    pub async fn remove_profile_tags(
        &self,
        user_ref: &str,
        raw: &[String],
    ) -> Result<UserProfile, DomainError> {
        let names = normalize_tag_names(raw, self.config.empty_tag_policy)?;
        self.profiles
            .unlink_tags(user_ref, &names)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::profile_not_found(user_ref))
    }
}
