//! Create message like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MessageLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MessageLike::MessageId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MessageLike::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(MessageLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_like_message")
                            .from(MessageLike::Table, MessageLike::MessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_like_user")
                            .from(MessageLike::Table, MessageLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (message_id, user_id) - set semantics, one like per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_message_like_message_user")
                    .table(MessageLike::Table)
                    .col(MessageLike::MessageId)
                    .col(MessageLike::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for per-viewer like-state lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_like_user_id")
                    .table(MessageLike::Table)
                    .col(MessageLike::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MessageLike {
    Table,
    Id,
    MessageId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
