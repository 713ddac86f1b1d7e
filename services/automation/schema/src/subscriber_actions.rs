use sea_orm::entity::prelude::*;

/// The action log: one row per (email, action) pair ever recorded.
///
/// Consulted by skip_if/only_if condition evaluation; written by webhook
/// side effects. The unique index makes re-recording an action a no-op.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriber_actions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Always stored lowercase.
    pub email: String,
    /// ActionTag code.
    pub action: i16,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
