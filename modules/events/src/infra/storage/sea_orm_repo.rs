//! SeaORM-backed repository implementation for the event and profile ports.
//!
//! Generic over the connection so tests can hand in a pool or a file-backed
//! SQLite handle. Every write that touches more than one table runs inside a
//! transaction opened from that connection.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sea_orm::{
    sea_query::{Expr, OnConflict, Query},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::contract::model::{Event, EventFilter, UserProfile};
use crate::domain::repo::{
    EventRecord, EventsRepository, Inserted, ProfileRecord, ProfilesRepository,
};
use crate::domain::validate::town_key;
use crate::infra::storage::entity::{event, event_tag, profile_tag, tag, user_profile};
use crate::infra::storage::tag_registry::get_or_create_tags;

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn price_to_cents(price: Decimal) -> anyhow::Result<i64> {
    (price * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or_else(|| anyhow!("price {price} does not fit the price column"))
}

fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn to_event(m: event::Model, tag_names: Vec<String>) -> Event {
    Event {
        id: m.id,
        title: m.title,
        town: m.town,
        date: m.date,
        venue: m.venue,
        description: m.description,
        price: m.price_cents.map(cents_to_price),
        photo: m.photo,
        tag_names,
    }
}

fn to_profile(m: user_profile::Model, tag_names: Vec<String>) -> anyhow::Result<UserProfile> {
    Ok(UserProfile {
        id: m.id,
        user_type: m.user_type.parse().context("corrupt user_type column")?,
        email_preference: m
            .email_preference
            .parse()
            .context("corrupt email_preference column")?,
        user_ref: m.user_ref,
        primary_city: m.primary_city,
        tag_names,
    })
}

/// Sorted tag names per event id.
async fn tag_names_by_event<C>(
    conn: &C,
    event_ids: Vec<Uuid>,
) -> anyhow::Result<HashMap<Uuid, Vec<String>>>
where
    C: ConnectionTrait,
{
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let links = event_tag::Entity::find()
        .filter(event_tag::Column::EventId.is_in(event_ids))
        .find_also_related(tag::Entity)
        .all(conn)
        .await
        .context("load event tags failed")?;

    let mut by_event: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (link, tag) in links {
        if let Some(tag) = tag {
            by_event.entry(link.event_id).or_default().push(tag.name);
        }
    }
    for names in by_event.values_mut() {
        names.sort();
    }
    Ok(by_event)
}

async fn profile_tag_names<C>(conn: &C, profile_id: Uuid) -> anyhow::Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let links = profile_tag::Entity::find()
        .filter(profile_tag::Column::ProfileId.eq(profile_id))
        .find_also_related(tag::Entity)
        .all(conn)
        .await
        .context("load profile tags failed")?;
    let mut names: Vec<String> = links
        .into_iter()
        .filter_map(|(_, tag)| tag.map(|t| t.name))
        .collect();
    names.sort();
    Ok(names)
}

async fn find_profile_row<C>(conn: &C, user_ref: &str) -> anyhow::Result<Option<user_profile::Model>>
where
    C: ConnectionTrait,
{
    user_profile::Entity::find()
        .filter(user_profile::Column::UserRef.eq(user_ref))
        .one(conn)
        .await
        .context("find profile failed")
}

async fn load_profile<C>(conn: &C, user_ref: &str) -> anyhow::Result<Option<UserProfile>>
where
    C: ConnectionTrait,
{
    match find_profile_row(conn, user_ref).await? {
        Some(row) => {
            let names = profile_tag_names(conn, row.id).await?;
            Ok(Some(to_profile(row, names)?))
        }
        None => Ok(None),
    }
}

#[async_trait::async_trait]
impl<C> EventsRepository for SeaOrmRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn insert_with_tags(
        &self,
        e: EventRecord,
        tag_names: &[String],
    ) -> anyhow::Result<Event> {
        let price_cents = e.price.map(price_to_cents).transpose()?;

        // Dropping the transaction on any early return rolls everything back
        let txn = self.conn.begin().await.context("begin transaction failed")?;

        let tags = get_or_create_tags(&txn, tag_names).await?;

        let m = event::ActiveModel {
            id: Set(e.id),
            title: Set(e.title),
            town_key: Set(town_key(&e.town)),
            town: Set(e.town),
            date: Set(e.date),
            venue: Set(e.venue),
            description: Set(e.description),
            price_cents: Set(price_cents),
            photo: Set(e.photo),
        };
        let row = m.insert(&txn).await.context("insert event failed")?;

        if !tags.is_empty() {
            let links = tags.iter().map(|t| event_tag::ActiveModel {
                event_id: Set(row.id),
                tag_id: Set(t.id),
            });
            event_tag::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .context("link event tags failed")?;
        }

        txn.commit().await.context("commit event failed")?;
        debug!(event_id = %row.id, tags = tags.len(), "event persisted");

        let names = tags.into_iter().map(|t| t.name).collect();
        Ok(to_event(row, names))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        let Some(row) = event::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?
        else {
            return Ok(None);
        };
        let mut names = tag_names_by_event(&self.conn, vec![row.id]).await?;
        let tag_names = names.remove(&row.id).unwrap_or_default();
        Ok(Some(to_event(row, tag_names)))
    }

    async fn list(&self, filter: &EventFilter) -> anyhow::Result<Vec<Event>> {
        let mut query = event::Entity::find();

        if !filter.towns.is_empty() {
            query = query.filter(event::Column::TownKey.is_in(filter.towns.iter().cloned()));
        }

        if !filter.tags.is_empty() {
            let tagged = Query::select()
                .column((event_tag::Entity, event_tag::Column::EventId))
                .from(event_tag::Entity)
                .inner_join(
                    tag::Entity,
                    Expr::col((tag::Entity, tag::Column::Id))
                        .equals((event_tag::Entity, event_tag::Column::TagId)),
                )
                .and_where(
                    Expr::col((tag::Entity, tag::Column::Name)).is_in(filter.tags.iter().cloned()),
                )
                .to_owned();
            query = query.filter(event::Column::Id.in_subquery(tagged));
        }

        let rows = query
            .order_by_desc(event::Column::Date)
            .order_by_asc(event::Column::Id)
            .all(&self.conn)
            .await
            .context("list events failed")?;

        let mut names = tag_names_by_event(&self.conn, rows.iter().map(|r| r.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let tag_names = names.remove(&row.id).unwrap_or_default();
                to_event(row, tag_names)
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl<C> ProfilesRepository for SeaOrmRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn insert_with_tags(
        &self,
        p: ProfileRecord,
        tag_names: &[String],
    ) -> anyhow::Result<Inserted<UserProfile>> {
        let txn = self.conn.begin().await.context("begin transaction failed")?;

        let row = user_profile::Model {
            id: p.id,
            user_ref: p.user_ref,
            user_type: p.user_type.as_str().to_string(),
            primary_city: p.primary_city,
            email_preference: p.email_preference.as_str().to_string(),
        };
        let am = user_profile::ActiveModel {
            id: Set(row.id),
            user_ref: Set(row.user_ref.clone()),
            user_type: Set(row.user_type.clone()),
            primary_city: Set(row.primary_city.clone()),
            email_preference: Set(row.email_preference.clone()),
        };
        let inserted = user_profile::Entity::insert(am)
            .on_conflict(
                OnConflict::column(user_profile::Column::UserRef)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("insert profile failed")?;
        if inserted == 0 {
            txn.rollback().await.context("rollback failed")?;
            return Ok(Inserted::Duplicate);
        }

        let tags = get_or_create_tags(&txn, tag_names).await?;
        if !tags.is_empty() {
            let links = tags.iter().map(|t| profile_tag::ActiveModel {
                profile_id: Set(row.id),
                tag_id: Set(t.id),
            });
            profile_tag::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .context("link profile tags failed")?;
        }

        txn.commit().await.context("commit profile failed")?;

        let names = tags.into_iter().map(|t| t.name).collect();
        Ok(Inserted::Created(to_profile(row, names)?))
    }

    async fn find_by_user_ref(&self, user_ref: &str) -> anyhow::Result<Option<UserProfile>> {
        load_profile(&self.conn, user_ref).await
    }

    async fn link_tags(
        &self,
        user_ref: &str,
        tag_names: &[String],
    ) -> anyhow::Result<Option<UserProfile>> {
        let txn = self.conn.begin().await.context("begin transaction failed")?;

        let Some(profile) = find_profile_row(&txn, user_ref).await? else {
            return Ok(None);
        };

        let tags = get_or_create_tags(&txn, tag_names).await?;
        if !tags.is_empty() {
            let links = tags.iter().map(|t| profile_tag::ActiveModel {
                profile_id: Set(profile.id),
                tag_id: Set(t.id),
            });
            profile_tag::Entity::insert_many(links)
                .on_conflict(
                    OnConflict::columns([profile_tag::Column::ProfileId, profile_tag::Column::TagId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .context("link profile tags failed")?;
        }

        txn.commit().await.context("commit profile tags failed")?;
        load_profile(&self.conn, user_ref).await
    }

    async fn unlink_tags(
        &self,
        user_ref: &str,
        tag_names: &[String],
    ) -> anyhow::Result<Option<UserProfile>> {
        let Some(profile) = find_profile_row(&self.conn, user_ref).await? else {
            return Ok(None);
        };

        if !tag_names.is_empty() {
            let tag_ids: Vec<Uuid> = tag::Entity::find()
                .select_only()
                .column(tag::Column::Id)
                .filter(tag::Column::Name.is_in(tag_names.iter().cloned()))
                .into_tuple()
                .all(&self.conn)
                .await
                .context("lookup tags failed")?;

            if !tag_ids.is_empty() {
                let res = profile_tag::Entity::delete_many()
                    .filter(profile_tag::Column::ProfileId.eq(profile.id))
                    .filter(profile_tag::Column::TagId.is_in(tag_ids))
                    .exec(&self.conn)
                    .await
                    .context("unlink profile tags failed")?;
                debug!(removed = res.rows_affected, "profile tags unlinked");
            }
        }

        load_profile(&self.conn, user_ref).await
    }
}
