//! Step advancement — the only place `current_step` increases.

use chrono::{DateTime, Utc};

use lexflow_domain::definitions;

use crate::domain::repository::EnrollmentRepository;
use crate::domain::types::{Advanced, Enrollment};
use crate::error::AutomationServiceError;
use crate::usecase::schedule::next_send_time;

/// Move an enrollment past its current step.
///
/// If a next step exists, schedule it; otherwise the sequence is exhausted
/// and the enrollment completes. Both writes are guarded updates, so two
/// workers racing on the same enrollment resolve to exactly one winner —
/// the loser sees [`Advanced::Stale`] and must not dispatch again.
///
/// Called exactly once per dispatched (or condition-skipped) step, after
/// dispatch succeeds, never before.
pub async fn advance<R: EnrollmentRepository>(
    repo: &R,
    enrollment: &Enrollment,
    now: DateTime<Utc>,
) -> Result<Advanced, AutomationServiceError> {
    let definition = definitions::find(enrollment.sequence_type)
        .ok_or(AutomationServiceError::UnknownSequence)?;
    let next_step_number = enrollment.current_step + 1;

    match definition.step(next_step_number) {
        None => {
            let completed = repo.complete(enrollment.id, now).await?;
            if completed {
                tracing::info!(
                    enrollment_id = %enrollment.id,
                    sequence_type = enrollment.sequence_type.as_str(),
                    "sequence completed"
                );
                Ok(Advanced::Completed)
            } else {
                Ok(Advanced::Stale)
            }
        }
        Some(step) => {
            let next_email_at = next_send_time(step, &enrollment.trigger_data, now);
            let advanced = repo
                .advance(
                    enrollment.id,
                    enrollment.current_step,
                    next_step_number,
                    next_email_at,
                )
                .await?;
            if advanced {
                Ok(Advanced::Next(next_step_number))
            } else {
                Ok(Advanced::Stale)
            }
        }
    }
}
