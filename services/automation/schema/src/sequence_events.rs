use sea_orm::entity::prelude::*;

/// Append-only engagement log entry. Never mutated after insertion.
///
/// `sequence_type` is copied from the owning enrollment at insert time so
/// analytics can count events with a single grouped query.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sequence_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub enrollment_id: Uuid,
    /// SequenceType code, denormalized from the enrollment.
    pub sequence_type: i16,
    /// SequenceEventType code: 0 sent, 1 opened, 2 clicked, 3 bounced, 4 unsubscribed.
    pub event_type: i16,
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sequence_enrollments::Entity",
        from = "Column::EnrollmentId",
        to = "super::sequence_enrollments::Column::Id"
    )]
    Enrollment,
}

impl Related<super::sequence_enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
