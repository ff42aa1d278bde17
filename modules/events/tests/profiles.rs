mod common;

use anyhow::Result;

use events::config::EventsConfig;
use events::contract::error::EventsError;
use events::contract::model::{EmailPreference, NewProfile, UserType};

use common::strings;

async fn client() -> std::sync::Arc<dyn events::contract::client::EventsApi> {
    common::module(common::memory_db().await, EventsConfig::default())
        .client()
        .expect("client")
}

fn profile(user_ref: &str, tags: &[&str]) -> NewProfile {
    NewProfile {
        user_ref: user_ref.to_string(),
        tags: strings(tags),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_applies_defaults_and_normalizes_tags() -> Result<()> {
    let client = client().await;

    let created = client
        .create_profile(profile("user-1", &["Music", " music", "Food"]))
        .await?;
    assert_eq!(created.user_ref, "user-1");
    assert_eq!(created.user_type, UserType::Local);
    assert_eq!(created.email_preference, EmailPreference::Weekly);
    assert_eq!(created.primary_city, "");
    assert_eq!(created.tag_names, vec!["food", "music"]);

    assert_eq!(client.get_profile("user-1").await?, created);
    Ok(())
}

#[tokio::test]
async fn create_keeps_explicit_choices() -> Result<()> {
    let client = client().await;
    let created = client
        .create_profile(NewProfile {
            user_ref: "venue-9".into(),
            user_type: Some(UserType::Venue),
            primary_city: Some("  Halifax ".into()),
            email_preference: Some(EmailPreference::Never),
            tags: vec![],
        })
        .await?;
    assert_eq!(created.user_type, UserType::Venue);
    assert_eq!(created.primary_city, "Halifax");
    assert_eq!(created.email_preference, EmailPreference::Never);
    assert!(created.tag_names.is_empty());
    Ok(())
}

#[tokio::test]
async fn second_profile_for_same_user_is_rejected() -> Result<()> {
    let client = client().await;
    client.create_profile(profile("user-1", &["music"])).await?;

    let err = client
        .create_profile(profile("user-1", &["food"]))
        .await
        .unwrap_err();
    assert_eq!(err, EventsError::profile_already_exists("user-1"));

    // The losing attempt must not have touched the stored profile or tags
    assert_eq!(client.get_profile("user-1").await?.tag_names, vec!["music"]);
    let names: Vec<_> = client.list_tags().await?.into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["music"]);
    Ok(())
}

#[tokio::test]
async fn missing_profile_is_reported() {
    let client = client().await;
    assert_eq!(
        client.get_profile("ghost").await.unwrap_err(),
        EventsError::profile_not_found("ghost")
    );
    assert_eq!(
        client
            .add_profile_tags("ghost", strings(&["music"]))
            .await
            .unwrap_err(),
        EventsError::profile_not_found("ghost")
    );
    assert_eq!(
        client
            .remove_profile_tags("ghost", strings(&["music"]))
            .await
            .unwrap_err(),
        EventsError::profile_not_found("ghost")
    );
}

#[tokio::test]
async fn adding_tags_is_idempotent() -> Result<()> {
    let client = client().await;
    client.create_profile(profile("user-1", &["music"])).await?;

    let updated = client
        .add_profile_tags("user-1", strings(&["Outdoors", "MUSIC"]))
        .await?;
    assert_eq!(updated.tag_names, vec!["music", "outdoors"]);

    let again = client
        .add_profile_tags("user-1", strings(&["outdoors"]))
        .await?;
    assert_eq!(again.tag_names, vec!["music", "outdoors"]);
    Ok(())
}

#[tokio::test]
async fn removing_tags_ignores_unlinked_names() -> Result<()> {
    let client = client().await;
    client
        .create_profile(profile("user-1", &["music", "food"]))
        .await?;

    let updated = client
        .remove_profile_tags("user-1", strings(&["Food", "never-seen"]))
        .await?;
    assert_eq!(updated.tag_names, vec!["music"]);

    // Removing a link never deletes the canonical tag
    let names: Vec<_> = client.list_tags().await?.into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["food", "music"]);
    Ok(())
}

#[tokio::test]
async fn profile_tags_share_rows_with_events() -> Result<()> {
    let client = client().await;
    client
        .create_event(common::new_event("Gig", "Leeds", "2026-01-01", &["Music"]))
        .await?;
    client.create_profile(profile("user-1", &["music "])).await?;

    assert_eq!(client.list_tags().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_profile_input_is_rejected() {
    let client = client().await;

    match client.create_profile(profile("  ", &[])).await {
        Err(EventsError::Validation { errors }) => assert!(errors.contains_key("user_ref")),
        other => panic!("expected validation error, got {other:?}"),
    }

    match client.create_profile(profile("user-2", &["   "])).await {
        Err(EventsError::Validation { errors }) => assert!(errors.contains_key("tags")),
        other => panic!("expected validation error, got {other:?}"),
    }

    match client
        .create_profile(NewProfile {
            user_ref: "user-3".into(),
            primary_city: Some("x".repeat(101)),
            ..Default::default()
        })
        .await
    {
        Err(EventsError::Validation { errors }) => assert!(errors.contains_key("primary_city")),
        other => panic!("expected validation error, got {other:?}"),
    }
}
