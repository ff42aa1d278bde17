//! Get-or-create for canonical tag rows.
//!
//! Creation is `INSERT .. ON CONFLICT (name) DO NOTHING` followed by a lookup,
//! so concurrent creators of the same name converge on the row that won the
//! unique constraint. The free function takes any `ConnectionTrait`, which
//! lets event and profile writes call it inside their own transaction.

use std::time::Duration;

use anyhow::Context;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::contract::model::Tag;
use crate::domain::repo::TagsRepository;
use crate::infra::storage::entity::tag;

/// Lookups after an insert that still miss a name are retried this many times.
const MAX_ATTEMPTS: u32 = 3;

/// Names that could not be read back after get-or-create.
#[derive(Debug, Error)]
#[error("tags still missing after {attempts} attempts: {names:?}")]
pub struct TagConflict {
    pub names: Vec<String>,
    pub attempts: u32,
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Ensure a row exists for every (normalized) name and return them ordered by name.
#[instrument(name = "events.storage.get_or_create_tags", skip_all, fields(count = names.len()))]
pub async fn get_or_create_tags<C>(conn: &C, names: &[String]) -> anyhow::Result<Vec<tag::Model>>
where
    C: ConnectionTrait,
{
    let mut wanted: Vec<String> = names.to_vec();
    wanted.sort();
    wanted.dedup();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        let rows = wanted.iter().map(|name| tag::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
        });
        match tag::Entity::insert_many(rows)
            .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await
        {
            Ok(created) => debug!(created, "tag insert done"),
            // Some backends still report the race instead of skipping the row
            Err(e) if is_unique_violation(&e) => debug!("tag insert raced: {}", e),
            Err(e) => return Err(e).context("insert tags failed"),
        }

        let found = tag::Entity::find()
            .filter(tag::Column::Name.is_in(wanted.iter().cloned()))
            .order_by_asc(tag::Column::Name)
            .all(conn)
            .await
            .context("lookup tags failed")?;

        if found.len() == wanted.len() {
            return Ok(found);
        }

        warn!(
            attempt,
            "tag lookup returned {} of {} names",
            found.len(),
            wanted.len()
        );
        if attempt >= MAX_ATTEMPTS {
            let missing = wanted
                .iter()
                .filter(|n| !found.iter().any(|t| &t.name == *n))
                .cloned()
                .collect();
            return Err(TagConflict {
                names: missing,
                attempts: attempt,
            }
            .into());
        }
        tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
    }
}

/// Standalone tag registry over a connection or pool.
pub struct TagRegistry<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> TagRegistry<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> TagsRepository for TagRegistry<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn get_or_create(&self, names: &[String]) -> anyhow::Result<Vec<Tag>> {
        let rows = get_or_create_tags(&self.conn, names).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> anyhow::Result<Vec<Tag>> {
        let rows = tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(&self.conn)
            .await
            .context("list tags failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
