#![allow(async_fn_in_trait)]

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use lexflow_domain::action::ActionTag;
use lexflow_domain::sequence::SequenceType;
use lexflow_domain::status::EnrollmentStatus;

use crate::domain::types::{
    ClaimOutcome, Enrollment, EnrollmentCounts, EventCounts, SequenceEvent,
};
use crate::error::AutomationServiceError;

/// Repository for webhook idempotency records.
pub trait WebhookEventRepository: Send + Sync {
    /// Atomically claim (provider, event_id) for processing.
    ///
    /// A fresh key inserts a `processing` row and yields `Claimed`. An
    /// existing key yields `Duplicate`, except for `failed` rows and
    /// `processing` rows older than `stale_after` (a crashed attempt), which
    /// are reclaimed via a guarded update so at most one caller wins.
    async fn claim(
        &self,
        provider: &str,
        event_id: &str,
        event_type: &str,
        stale_after: Duration,
    ) -> Result<ClaimOutcome, AutomationServiceError>;

    async fn mark_processed(
        &self,
        provider: &str,
        event_id: &str,
    ) -> Result<(), AutomationServiceError>;

    async fn mark_failed(
        &self,
        provider: &str,
        event_id: &str,
    ) -> Result<(), AutomationServiceError>;
}

/// Repository for sequence enrollments.
pub trait EnrollmentRepository: Send + Sync {
    /// Insert a new enrollment. The store's partial unique index turns a
    /// second outstanding (email, sequence_type) row into `AlreadyEnrolled`.
    async fn create(&self, enrollment: &Enrollment) -> Result<(), AutomationServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>, AutomationServiceError>;

    /// Active enrollments with `next_email_at <= now`, ascending, limited.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Enrollment>, AutomationServiceError>;

    /// Guarded step advance: only applies while the row is still active at
    /// `expected_step`. Returns `true` if the row matched.
    async fn advance(
        &self,
        id: Uuid,
        expected_step: u32,
        next_step: u32,
        next_email_at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError>;

    /// Terminal completion: status = completed, `next_email_at` cleared.
    /// Returns `true` if the row was still active.
    async fn complete(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError>;

    async fn mark_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AutomationServiceError>;

    /// Cancel the outstanding enrollment for (email, sequence_type),
    /// recording `reason` in metadata. Returns `true` if a row was
    /// cancelled; an absent or already-terminal row is a no-op.
    async fn cancel(
        &self,
        email: &str,
        sequence_type: SequenceType,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError>;

    /// Same as `cancel`, keyed by enrollment id (unsubscribe path).
    async fn cancel_by_id(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError>;

    /// Guarded status flip for administrative pause/resume. Returns `true`
    /// if a row in `from` status matched.
    async fn set_status(
        &self,
        email: &str,
        sequence_type: SequenceType,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, AutomationServiceError>;

    async fn count_by_status(
        &self,
        sequence_type: SequenceType,
    ) -> Result<EnrollmentCounts, AutomationServiceError>;
}

/// Repository for the append-only engagement log.
pub trait SequenceEventRepository: Send + Sync {
    async fn record(&self, event: &SequenceEvent) -> Result<(), AutomationServiceError>;

    async fn count_by_type(
        &self,
        sequence_type: SequenceType,
    ) -> Result<EventCounts, AutomationServiceError>;
}

/// The per-subject action log consulted by skip_if/only_if conditions.
pub trait ActionLogPort: Send + Sync {
    async fn actions(&self, email: &str) -> Result<HashSet<ActionTag>, AutomationServiceError>;

    /// Record an action; re-recording the same (email, action) is a no-op.
    async fn record(&self, email: &str, action: ActionTag) -> Result<(), AutomationServiceError>;
}

/// Port to the external mailer collaborator. `template_id` is an opaque
/// lookup key resolved by the provider.
pub trait MailerPort: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template_id: &str,
    ) -> Result<(), AutomationServiceError>;
}
