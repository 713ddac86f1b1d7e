use lexflow_domain::sequence::SequenceType;

use crate::domain::repository::{EnrollmentRepository, SequenceEventRepository};
use crate::domain::types::SequenceAnalytics;
use crate::error::AutomationServiceError;

// ── SequenceAnalytics ────────────────────────────────────────────────────────

pub struct SequenceAnalyticsUseCase<E, S>
where
    E: EnrollmentRepository,
    S: SequenceEventRepository,
{
    pub enrollments: E,
    pub events: S,
}

impl<E, S> SequenceAnalyticsUseCase<E, S>
where
    E: EnrollmentRepository,
    S: SequenceEventRepository,
{
    /// Tally enrollments by status and compute open/click rates.
    ///
    /// Rates are integer percentages against sent events; with no sends the
    /// denominator is clamped to 1, so the rates read 0 rather than
    /// dividing by zero. Callers should not over-interpret rates computed
    /// from a near-zero denominator.
    pub async fn execute(
        &self,
        sequence_type: SequenceType,
    ) -> Result<SequenceAnalytics, AutomationServiceError> {
        let counts = self.enrollments.count_by_status(sequence_type).await?;
        let events = self.events.count_by_type(sequence_type).await?;

        let denominator = events.sent.max(1);
        Ok(SequenceAnalytics {
            total_enrolled: counts.total,
            active: counts.active,
            completed: counts.completed,
            cancelled: counts.cancelled,
            open_rate: rate(events.opened, denominator),
            click_rate: rate(events.clicked, denominator),
        })
    }
}

fn rate(numerator: u64, denominator: u64) -> u32 {
    ((numerator as f64 / denominator as f64) * 100.0).round() as u32
}
