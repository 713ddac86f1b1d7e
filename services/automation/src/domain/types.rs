use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use lexflow_domain::sequence::SequenceType;
use lexflow_domain::status::{EnrollmentStatus, SequenceEventType};

/// One subject's participation in one sequence.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: Uuid,
    /// Always lowercase.
    pub email: String,
    pub sequence_type: SequenceType,
    /// The step currently pending dispatch (1-based).
    pub current_step: u32,
    pub status: EnrollmentStatus,
    /// Context captured at enrollment time (e.g. `appointment_at` for
    /// booking reminders, the abandoned cart contents).
    pub trigger_data: serde_json::Value,
    pub metadata: serde_json::Value,
    pub started_at: DateTime<Utc>,
    /// Null exactly when status is completed or cancelled.
    pub next_email_at: Option<DateTime<Utc>>,
    pub last_email_sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Append-only engagement log entry.
#[derive(Debug, Clone)]
pub struct SequenceEvent {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub sequence_type: SequenceType,
    pub event_type: SequenceEventType,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Result of trying to claim a webhook event for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller owns the event; the side effect must run exactly once.
    Claimed,
    /// A prior or concurrent attempt holds the event; do not run the side
    /// effect.
    Duplicate,
}

/// Result of advancing an enrollment past its current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advanced {
    /// Moved to the given step number.
    Next(u32),
    /// No further step exists; the enrollment is completed.
    Completed,
    /// The guarded update matched no row — a concurrent worker got there
    /// first, or the enrollment left the active state.
    Stale,
}

/// Per-run counters returned to the scheduler driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Steps dispatched or condition-skipped this run.
    pub processed: u32,
    /// Enrollments whose dispatch failed and will be retried next run.
    pub errors: u32,
    /// Due candidates examined.
    pub total: u32,
}

/// Enrollment tallies for one sequence type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentCounts {
    pub total: u64,
    pub active: u64,
    pub paused: u64,
    pub completed: u64,
    pub cancelled: u64,
}

/// Engagement event tallies for one sequence type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub sent: u64,
    pub opened: u64,
    pub clicked: u64,
}

/// Aggregate analytics for one sequence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceAnalytics {
    pub total_enrolled: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Integer percentage, opened / sent.
    pub open_rate: u32,
    /// Integer percentage, clicked / sent.
    pub click_rate: u32,
}
