use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    Title,
    Town,
    TownKey,
    Date,
    Venue,
    Description,
    PriceCents,
    Photo,
}

#[derive(DeriveIden)]
enum EventTags {
    Table,
    EventId,
    TagId,
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
    UserRef,
    UserType,
    PrimaryCity,
    EmailPreference,
}

#[derive(DeriveIden)]
enum ProfileTags {
    Table,
    ProfileId,
    TagId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Tags::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Events::Town).string_len(100).not_null())
                    .col(ColumnDef::new(Events::TownKey).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Events::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Events::Venue).string_len(200).not_null())
                    .col(ColumnDef::new(Events::Description).text().not_null())
                    .col(ColumnDef::new(Events::PriceCents).big_integer().null())
                    .col(ColumnDef::new(Events::Photo).string_len(255).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_date")
                    .table(Events::Table)
                    .col(Events::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_town_key")
                    .table(Events::Table)
                    .col(Events::TownKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventTags::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventTags::TagId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(EventTags::EventId)
                            .col(EventTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_tags_event")
                            .from(EventTags::Table, EventTags::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_tags_tag")
                            .from(EventTags::Table, EventTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UserRef)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UserType)
                            .string_len(16)
                            .not_null()
                            .default("LOCAL"),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::PrimaryCity)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::EmailPreference)
                            .string_len(16)
                            .not_null()
                            .default("WEEKLY"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProfileTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProfileTags::ProfileId).uuid().not_null())
                    .col(ColumnDef::new(ProfileTags::TagId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(ProfileTags::ProfileId)
                            .col(ProfileTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_tags_profile")
                            .from(ProfileTags::Table, ProfileTags::ProfileId)
                            .to(UserProfiles::Table, UserProfiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_tags_tag")
                            .from(ProfileTags::Table, ProfileTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProfileTags::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventTags::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).if_exists().to_owned())
            .await
    }
}
