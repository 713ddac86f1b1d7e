use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SequenceEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SequenceEnrollments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SequenceEnrollments::Email).text().not_null())
                    .col(
                        ColumnDef::new(SequenceEnrollments::SequenceType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::CurrentStep)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::Status)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::TriggerData)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::Metadata)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::NextEmailAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::LastEmailSentAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(SequenceEnrollments::CompletedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active or paused enrollment per (email, sequence_type).
        // Partial unique indexes need raw SQL; sea-query's IndexCreateStatement
        // has no WHERE clause.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX uq_sequence_enrollments_outstanding \
                 ON sequence_enrollments (email, sequence_type) \
                 WHERE status IN (0, 1)",
            )
            .await?;

        // Serves the due query: status = active AND next_email_at <= now.
        manager
            .create_index(
                Index::create()
                    .table(SequenceEnrollments::Table)
                    .col(SequenceEnrollments::Status)
                    .col(SequenceEnrollments::NextEmailAt)
                    .name("idx_sequence_enrollments_status_next_email_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SequenceEnrollments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SequenceEnrollments {
    Table,
    Id,
    Email,
    SequenceType,
    CurrentStep,
    Status,
    TriggerData,
    Metadata,
    StartedAt,
    NextEmailAt,
    LastEmailSentAt,
    CompletedAt,
}
