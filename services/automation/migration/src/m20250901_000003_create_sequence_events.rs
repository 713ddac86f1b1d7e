use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SequenceEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SequenceEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SequenceEvents::EnrollmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEvents::SequenceType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEvents::EventType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEvents::Metadata)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SequenceEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SequenceEvents::Table, SequenceEvents::EnrollmentId)
                            .to(SequenceEnrollments::Table, SequenceEnrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(SequenceEvents::Table)
                    .col(SequenceEvents::EnrollmentId)
                    .name("idx_sequence_events_enrollment_id")
                    .to_owned(),
            )
            .await?;

        // Serves the analytics counts: group by event_type within a sequence.
        manager
            .create_index(
                Index::create()
                    .table(SequenceEvents::Table)
                    .col(SequenceEvents::SequenceType)
                    .col(SequenceEvents::EventType)
                    .name("idx_sequence_events_sequence_type_event_type")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SequenceEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SequenceEvents {
    Table,
    Id,
    EnrollmentId,
    SequenceType,
    EventType,
    Metadata,
    CreatedAt,
}

#[derive(Iden)]
enum SequenceEnrollments {
    Table,
    Id,
}
