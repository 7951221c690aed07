use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create user table
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string_len(User::Name, 50).unique_key())
                    .col(string(User::Password))
                    .col(string_len_null(User::Email, 100))
                    .to_owned(),
            )
            .await?;

        // Create advert table
        manager
            .create_table(
                Table::create()
                    .table(Advert::Table)
                    .if_not_exists()
                    .col(pk_auto(Advert::Id))
                    .col(string_len(Advert::Title, 50))
                    .col(text_null(Advert::Note))
                    .col(
                        timestamp_with_time_zone(Advert::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(integer(Advert::OwnerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advert_owner")
                            .from(Advert::Table, Advert::OwnerId)
                            .to(User::Table, User::Id)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order to respect the foreign key
        manager
            .drop_table(Table::drop().table(Advert::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Name,
    Password,
    Email,
}

#[derive(DeriveIden)]
enum Advert {
    Table,
    Id,
    Title,
    Note,
    CreatedAt,
    OwnerId,
}
