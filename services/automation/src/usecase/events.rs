use chrono::Utc;
use uuid::Uuid;

use lexflow_domain::status::SequenceEventType;

use crate::domain::repository::{EnrollmentRepository, SequenceEventRepository};
use crate::domain::types::SequenceEvent;
use crate::error::AutomationServiceError;

// ── RecordEngagement ─────────────────────────────────────────────────────────

pub struct RecordEngagementUseCase<E, S>
where
    E: EnrollmentRepository,
    S: SequenceEventRepository,
{
    pub enrollments: E,
    pub events: S,
}

impl<E, S> RecordEngagementUseCase<E, S>
where
    E: EnrollmentRepository,
    S: SequenceEventRepository,
{
    /// Append one engagement event to the log. An unsubscribe additionally
    /// cancels the owning enrollment; any dispatch already in flight is not
    /// rolled back.
    pub async fn execute(
        &self,
        enrollment_id: Uuid,
        event_type: SequenceEventType,
        metadata: serde_json::Value,
    ) -> Result<(), AutomationServiceError> {
        let enrollment = self
            .enrollments
            .find_by_id(enrollment_id)
            .await?
            .ok_or(AutomationServiceError::EnrollmentNotFound)?;

        self.events
            .record(&SequenceEvent {
                id: Uuid::now_v7(),
                enrollment_id,
                sequence_type: enrollment.sequence_type,
                event_type,
                metadata,
                created_at: Utc::now(),
            })
            .await?;

        if event_type == SequenceEventType::Unsubscribed {
            self.enrollments
                .cancel_by_id(enrollment_id, "unsubscribed", Utc::now())
                .await?;
        }
        Ok(())
    }
}
