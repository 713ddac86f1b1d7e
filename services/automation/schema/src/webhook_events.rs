use sea_orm::entity::prelude::*;

/// Idempotency record for one inbound provider event.
///
/// The (provider, event_id) pair carries a unique index; the insert conflict
/// on that index is what makes duplicate deliveries detectable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider: String,
    pub event_id: String,
    pub event_type: String,
    /// WebhookStatus code: 0 processing, 1 processed, 2 failed.
    pub status: i16,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
