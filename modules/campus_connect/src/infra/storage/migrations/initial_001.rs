use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContentItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContentItems::Kind).string().not_null())
                    .col(ColumnDef::new(ContentItems::Title).string().not_null())
                    .col(ColumnDef::new(ContentItems::Description).text().not_null())
                    .col(ColumnDef::new(ContentItems::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(ContentItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContentItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContentItems::EventDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(ContentItems::Location).string())
                    .col(ColumnDef::new(ContentItems::RegistrationLimit).big_integer())
                    .col(ColumnDef::new(ContentItems::FileUrl).string())
                    .col(ColumnDef::new(ContentItems::Category).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_items_kind_created_at")
                    .table(ContentItems::Table)
                    .col(ContentItems::Kind)
                    .col(ContentItems::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Seq)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Comments::ItemId).uuid().not_null())
                    .col(ColumnDef::new(Comments::Text).text().not_null())
                    .col(ColumnDef::new(Comments::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_item")
                            .from(Comments::Table, Comments::ItemId)
                            .to(ContentItems::Table, ContentItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_item")
                    .table(Comments::Table)
                    .col(Comments::ItemId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Likes::ItemId).uuid().not_null())
                    .col(ColumnDef::new(Likes::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Likes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(Index::create().col(Likes::ItemId).col(Likes::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_item")
                            .from(Likes::Table, Likes::ItemId)
                            .to(ContentItems::Table, ContentItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventRegistrations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventRegistrations::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventRegistrations::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(EventRegistrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(EventRegistrations::EventId)
                            .col(EventRegistrations::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registrations_event")
                            .from(EventRegistrations::Table, EventRegistrations::EventId)
                            .to(ContentItems::Table, ContentItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventRegistrations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContentItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContentItems {
    Table,
    Id,
    Kind,
    Title,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    EventDate,
    Location,
    RegistrationLimit,
    FileUrl,
    Category,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Seq,
    Id,
    ItemId,
    Text,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    ItemId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EventRegistrations {
    Table,
    EventId,
    UserId,
    CreatedAt,
}
