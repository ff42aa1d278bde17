use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Identity subsystem's reference; one profile per user.
    #[sea_orm(unique)]
    pub user_ref: String,
    /// LOCAL | BUSINESS | VENUE
    pub user_type: String,
    pub primary_city: String,
    /// WEEKLY | MONTHLY | NEVER
    pub email_preference: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profile_tag::Entity")]
    ProfileTag,
}

impl Related<super::profile_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileTag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
