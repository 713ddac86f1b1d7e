use sea_orm_migration::prelude::*;

mod m20250901_000001_create_webhook_events;
mod m20250901_000002_create_sequence_enrollments;
mod m20250901_000003_create_sequence_events;
mod m20250901_000004_create_subscriber_actions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_webhook_events::Migration),
            Box::new(m20250901_000002_create_sequence_enrollments::Migration),
            Box::new(m20250901_000003_create_sequence_events::Migration),
            Box::new(m20250901_000004_create_subscriber_actions::Migration),
        ]
    }
}
