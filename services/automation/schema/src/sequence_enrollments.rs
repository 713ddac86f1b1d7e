use sea_orm::entity::prelude::*;

/// One subject's participation in one sequence.
///
/// A partial unique index on (email, sequence_type) over active/paused rows
/// enforces the at-most-one-outstanding-enrollment invariant at the store
/// level.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sequence_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Always stored lowercase.
    pub email: String,
    /// SequenceType code.
    pub sequence_type: i16,
    /// The step currently pending dispatch (1-based).
    pub current_step: i32,
    /// EnrollmentStatus code: 0 active, 1 paused, 2 completed, 3 cancelled.
    pub status: i16,
    #[sea_orm(column_type = "JsonBinary")]
    pub trigger_data: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Null exactly when status is completed or cancelled.
    pub next_email_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_email_sent_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sequence_events::Entity")]
    SequenceEvents,
}

impl Related<super::sequence_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SequenceEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
