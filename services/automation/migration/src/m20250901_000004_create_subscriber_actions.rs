use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubscriberActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriberActions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubscriberActions::Email).text().not_null())
                    .col(
                        ColumnDef::new(SubscriberActions::Action)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriberActions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Re-recording an action is an ON CONFLICT DO NOTHING no-op.
        manager
            .create_index(
                Index::create()
                    .table(SubscriberActions::Table)
                    .col(SubscriberActions::Email)
                    .col(SubscriberActions::Action)
                    .unique()
                    .name("uq_subscriber_actions_email_action")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubscriberActions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SubscriberActions {
    Table,
    Id,
    Email,
    Action,
    CreatedAt,
}
