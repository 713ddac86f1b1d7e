use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use lexflow_domain::definitions;
use lexflow_domain::sequence::SequenceType;
use lexflow_domain::status::EnrollmentStatus;

use crate::domain::repository::EnrollmentRepository;
use crate::domain::types::Enrollment;
use crate::error::AutomationServiceError;
use crate::usecase::schedule::next_send_time;

/// Lowercase and validate a subject address. Enrollment compares emails
/// case-insensitively, so the canonical stored form is lowercase.
pub fn normalize_email(raw: &str) -> Result<String, AutomationServiceError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AutomationServiceError::InvalidEmail),
    }
}

// ── Enroll ───────────────────────────────────────────────────────────────────

pub struct EnrollInput {
    pub email: String,
    pub sequence_type: SequenceType,
    pub trigger_data: serde_json::Value,
}

pub struct EnrollUseCase<R: EnrollmentRepository> {
    pub repo: R,
}

impl<R: EnrollmentRepository> EnrollUseCase<R> {
    /// Enroll a subject into a sequence, scheduling its first step.
    ///
    /// Fails fast on unknown or inactive definitions; a second outstanding
    /// enrollment for the same (email, sequence_type) surfaces as
    /// `AlreadyEnrolled` from the store's unique index.
    pub async fn execute(&self, input: EnrollInput) -> Result<Enrollment, AutomationServiceError> {
        let definition = definitions::find(input.sequence_type)
            .ok_or(AutomationServiceError::UnknownSequence)?;
        if !definition.active {
            return Err(AutomationServiceError::SequenceInactive);
        }
        let first_step = definition
            .step(1)
            .ok_or(AutomationServiceError::UnknownSequence)?;

        let email = normalize_email(&input.email)?;
        let now = Utc::now();
        let enrollment = Enrollment {
            id: Uuid::now_v7(),
            email,
            sequence_type: input.sequence_type,
            current_step: 1,
            status: EnrollmentStatus::Active,
            trigger_data: input.trigger_data.clone(),
            metadata: json!({}),
            started_at: now,
            next_email_at: Some(next_send_time(first_step, &input.trigger_data, now)),
            last_email_sent_at: None,
            completed_at: None,
        };

        self.repo.create(&enrollment).await?;
        tracing::info!(
            enrollment_id = %enrollment.id,
            sequence_type = input.sequence_type.as_str(),
            "enrolled"
        );
        Ok(enrollment)
    }
}

// ── Remove (cancel) ──────────────────────────────────────────────────────────

pub struct RemoveUseCase<R: EnrollmentRepository> {
    pub repo: R,
}

impl<R: EnrollmentRepository> RemoveUseCase<R> {
    /// Cancel the outstanding enrollment, if any. Idempotent: removing an
    /// already-terminal or absent enrollment is a successful no-op.
    pub async fn execute(
        &self,
        email: &str,
        sequence_type: SequenceType,
        reason: &str,
    ) -> Result<(), AutomationServiceError> {
        let email = email.trim().to_lowercase();
        let cancelled = self
            .repo
            .cancel(&email, sequence_type, reason, Utc::now())
            .await?;
        if cancelled {
            tracing::info!(sequence_type = sequence_type.as_str(), reason, "enrollment cancelled");
        }
        Ok(())
    }
}

// ── Pause / Resume (administrative) ──────────────────────────────────────────

pub struct PauseUseCase<R: EnrollmentRepository> {
    pub repo: R,
}

impl<R: EnrollmentRepository> PauseUseCase<R> {
    pub async fn execute(
        &self,
        email: &str,
        sequence_type: SequenceType,
    ) -> Result<(), AutomationServiceError> {
        let email = email.trim().to_lowercase();
        let paused = self
            .repo
            .set_status(
                &email,
                sequence_type,
                EnrollmentStatus::Active,
                EnrollmentStatus::Paused,
            )
            .await?;
        if !paused {
            return Err(AutomationServiceError::EnrollmentNotFound);
        }
        Ok(())
    }
}

pub struct ResumeUseCase<R: EnrollmentRepository> {
    pub repo: R,
}

impl<R: EnrollmentRepository> ResumeUseCase<R> {
    pub async fn execute(
        &self,
        email: &str,
        sequence_type: SequenceType,
    ) -> Result<(), AutomationServiceError> {
        let email = email.trim().to_lowercase();
        let resumed = self
            .repo
            .set_status(
                &email,
                sequence_type,
                EnrollmentStatus::Paused,
                EnrollmentStatus::Active,
            )
            .await?;
        if !resumed {
            return Err(AutomationServiceError::EnrollmentNotFound);
        }
        Ok(())
    }
}
