use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub town: String,
    /// Case-folded `town`, the column town filters match against
    pub town_key: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// decimal(10,2) stored as integer cents
    pub price_cents: Option<i64>,
    pub photo: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_tag::Entity")]
    EventTag,
}

impl Related<super::event_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventTag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
