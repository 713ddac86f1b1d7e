//! The scheduler-driven dispatch loop.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use lexflow_domain::definitions;
use lexflow_domain::status::SequenceEventType;

use crate::domain::repository::{
    ActionLogPort, EnrollmentRepository, MailerPort, SequenceEventRepository,
};
use crate::domain::types::{DispatchSummary, Enrollment, SequenceEvent};
use crate::error::AutomationServiceError;
use crate::usecase::advance::advance;

/// Polls due enrollments and dispatches one email per due step.
///
/// Driven by an external cron trigger; all temporal state lives in
/// `next_email_at`, so runs are stateless and the process may restart
/// freely between them. One failing enrollment never aborts the batch.
pub struct ProcessDueEmailsUseCase<E, S, A, M>
where
    E: EnrollmentRepository,
    S: SequenceEventRepository,
    A: ActionLogPort,
    M: MailerPort,
{
    pub enrollments: E,
    pub events: S,
    pub actions: A,
    pub mailer: M,
    /// Caps per-run work; anything left over is picked up next run.
    pub batch_size: u64,
}

/// What dispatch did with one due enrollment.
enum StepOutcome {
    /// Sent, or condition-skipped and advanced.
    Handled,
    /// Left untouched for a later run (closed send window, stale guard).
    Deferred,
}

impl<E, S, A, M> ProcessDueEmailsUseCase<E, S, A, M>
where
    E: EnrollmentRepository,
    S: SequenceEventRepository,
    A: ActionLogPort,
    M: MailerPort,
{
    pub async fn execute(&self) -> Result<DispatchSummary, AutomationServiceError> {
        let now = Utc::now();
        let due = self.enrollments.list_due(now, self.batch_size).await?;

        let mut summary = DispatchSummary {
            total: due.len() as u32,
            ..Default::default()
        };
        for enrollment in &due {
            match self.dispatch_one(enrollment, now).await {
                Ok(StepOutcome::Handled) => summary.processed += 1,
                Ok(StepOutcome::Deferred) => {}
                Err(e) => {
                    // Leave the row untouched; the next run retries it.
                    summary.errors += 1;
                    tracing::warn!(
                        enrollment_id = %enrollment.id,
                        sequence_type = enrollment.sequence_type.as_str(),
                        step = enrollment.current_step,
                        error = %e,
                        "dispatch failed"
                    );
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            errors = summary.errors,
            total = summary.total,
            "dispatch run finished"
        );
        Ok(summary)
    }

    async fn dispatch_one(
        &self,
        enrollment: &Enrollment,
        now: DateTime<Utc>,
    ) -> Result<StepOutcome, AutomationServiceError> {
        let Some(definition) = definitions::find(enrollment.sequence_type) else {
            self.enrollments.complete(enrollment.id, now).await?;
            return Ok(StepOutcome::Handled);
        };
        let Some(step) = definition.step(enrollment.current_step) else {
            // Exhausted row that slipped past advancement.
            self.enrollments.complete(enrollment.id, now).await?;
            return Ok(StepOutcome::Handled);
        };

        // Seasonal gating: outside the window the row stays due and is
        // re-examined every run until the window opens.
        if let Some(window) = &step.send_window {
            if !window.contains(now.date_naive()) {
                return Ok(StepOutcome::Deferred);
            }
        }

        if let Some(conditions) = &step.conditions {
            let actions = self.actions.actions(&enrollment.email).await?;
            if conditions.should_skip(&actions) {
                // Bypassed, not retried: advance without dispatching.
                advance(&self.enrollments, enrollment, now).await?;
                return Ok(StepOutcome::Handled);
            }
        }

        self.mailer
            .send(&enrollment.email, step.subject, step.template_id)
            .await?;

        self.events
            .record(&SequenceEvent {
                id: Uuid::now_v7(),
                enrollment_id: enrollment.id,
                sequence_type: enrollment.sequence_type,
                event_type: SequenceEventType::Sent,
                metadata: json!({ "step": step.step_number, "template_id": step.template_id }),
                created_at: now,
            })
            .await?;
        self.enrollments.mark_sent(enrollment.id, now).await?;
        advance(&self.enrollments, enrollment, now).await?;
        Ok(StepOutcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::enroll::{EnrollInput, EnrollUseCase};
    use crate::usecase::testsupport::{
        MockActionLog, MockEnrollmentRepo, MockEventRepo, MockMailer,
    };
    use chrono::{Datelike, Duration};
    use lexflow_domain::action::ActionTag;
    use lexflow_domain::sequence::SequenceType;
    use lexflow_domain::status::EnrollmentStatus;

    fn loop_over(
        enrollments: MockEnrollmentRepo,
        actions: MockActionLog,
        mailer: MockMailer,
    ) -> ProcessDueEmailsUseCase<MockEnrollmentRepo, MockEventRepo, MockActionLog, MockMailer>
    {
        ProcessDueEmailsUseCase {
            enrollments,
            events: MockEventRepo::default(),
            actions,
            mailer,
            batch_size: 50,
        }
    }

    async fn enroll(
        repo: &MockEnrollmentRepo,
        email: &str,
        sequence_type: SequenceType,
        trigger_data: serde_json::Value,
    ) {
        EnrollUseCase { repo: repo.clone() }
            .execute(EnrollInput {
                email: email.into(),
                sequence_type,
                trigger_data,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_send_due_step_and_advance() {
        let repo = MockEnrollmentRepo::default();
        enroll(&repo, "doc@example.com", SequenceType::WelcomeSeries, json!({})).await;
        let uc = loop_over(repo, MockActionLog::default(), MockMailer::default());
        let run_at = Utc::now();

        let summary = uc.execute().await.unwrap();

        assert_eq!(summary, DispatchSummary { processed: 1, errors: 0, total: 1 });
        let sent = uc.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "doc@example.com");
        assert_eq!(sent[0].2, "welcome-intro");

        let row = uc.enrollments.rows.lock().unwrap()[0].clone();
        assert_eq!(row.current_step, 2);
        assert!(row.last_email_sent_at.is_some());
        // next step is 48h out from the run
        let due = row.next_email_at.unwrap();
        assert!(due >= run_at + Duration::hours(48) && due <= Utc::now() + Duration::hours(48));

        let events = uc.events.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, SequenceEventType::Sent);
    }

    #[tokio::test]
    async fn should_ignore_enrollments_not_yet_due() {
        let repo = MockEnrollmentRepo::default();
        // booking reminder 96h out: first step due 48h before, so nothing now
        let appointment = Utc::now() + Duration::hours(96);
        enroll(
            &repo,
            "client@example.com",
            SequenceType::BookingReminder,
            json!({ "appointment_at": appointment.to_rfc3339() }),
        )
        .await;
        let uc = loop_over(repo, MockActionLog::default(), MockMailer::default());

        let summary = uc.execute().await.unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert!(uc.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_bypass_step_when_skip_if_action_recorded() {
        let repo = MockEnrollmentRepo::default();
        enroll(&repo, "doc@example.com", SequenceType::CartAbandonment, json!({})).await;
        // make the 1h-delayed first step due now
        repo.rows.lock().unwrap()[0].next_email_at = Some(Utc::now() - Duration::minutes(5));
        let actions = MockActionLog::with_actions("doc@example.com", &[ActionTag::HasPurchased]);
        let uc = loop_over(repo, actions, MockMailer::default());

        let summary = uc.execute().await.unwrap();

        // advanced without dispatch: mailer untouched, step moved on
        assert_eq!(summary.processed, 1);
        assert!(uc.mailer.sent.lock().unwrap().is_empty());
        assert_eq!(uc.enrollments.rows.lock().unwrap()[0].current_step, 2);
        assert!(uc.events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_defer_step_outside_send_window() {
        let now = Utc::now();
        // financial_year_review is gated to 01-15..06-30
        let in_window = (115..=630).contains(&(now.month() * 100 + now.day()));
        let repo = MockEnrollmentRepo::default();
        enroll(&repo, "doc@example.com", SequenceType::FinancialYearReview, json!({})).await;
        let original_due = repo.rows.lock().unwrap()[0].next_email_at;
        let uc = loop_over(repo, MockActionLog::default(), MockMailer::default());

        let summary = uc.execute().await.unwrap();

        if in_window {
            assert_eq!(summary.processed, 1);
            assert_eq!(uc.mailer.sent.lock().unwrap().len(), 1);
        } else {
            // skipped this run, row untouched, retried next run
            assert_eq!(summary, DispatchSummary { processed: 0, errors: 0, total: 1 });
            assert!(uc.mailer.sent.lock().unwrap().is_empty());
            let row = uc.enrollments.rows.lock().unwrap()[0].clone();
            assert_eq!(row.status, EnrollmentStatus::Active);
            assert_eq!(row.next_email_at, original_due);
            assert_eq!(row.current_step, 1);
        }
    }

    #[tokio::test]
    async fn should_leave_enrollment_untouched_when_mailer_fails() {
        let repo = MockEnrollmentRepo::default();
        enroll(&repo, "doc@example.com", SequenceType::WelcomeSeries, json!({})).await;
        let original_due = repo.rows.lock().unwrap()[0].next_email_at;
        let uc = loop_over(repo, MockActionLog::default(), MockMailer::failing());

        let summary = uc.execute().await.unwrap();

        assert_eq!(summary, DispatchSummary { processed: 0, errors: 1, total: 1 });
        let row = uc.enrollments.rows.lock().unwrap()[0].clone();
        assert_eq!(row.current_step, 1);
        assert_eq!(row.status, EnrollmentStatus::Active);
        assert_eq!(row.next_email_at, original_due);
        assert!(uc.events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_not_let_one_failure_block_the_batch() {
        let repo = MockEnrollmentRepo::default();
        enroll(&repo, "a@example.com", SequenceType::WelcomeSeries, json!({})).await;
        enroll(&repo, "b@example.com", SequenceType::CartAbandonment, json!({})).await;
        repo.rows.lock().unwrap()[1].next_email_at = Some(Utc::now() - Duration::minutes(5));
        // skip-if bypass for b; mailer fails for a
        let actions = MockActionLog::with_actions("b@example.com", &[ActionTag::HasPurchased]);
        let uc = loop_over(repo, actions, MockMailer::failing());

        let summary = uc.execute().await.unwrap();

        assert_eq!(summary, DispatchSummary { processed: 1, errors: 1, total: 2 });
    }

    #[tokio::test]
    async fn should_complete_and_stop_selecting_exhausted_enrollments() {
        let repo = MockEnrollmentRepo::default();
        enroll(&repo, "doc@example.com", SequenceType::BookingReminder, json!({})).await;
        let uc = loop_over(repo, MockActionLog::default(), MockMailer::default());

        // without an appointment reference both steps are immediately due
        let first = uc.execute().await.unwrap();
        assert_eq!(first.processed, 1);
        let second = uc.execute().await.unwrap();
        assert_eq!(second.processed, 1);

        let row = uc.enrollments.rows.lock().unwrap()[0].clone();
        assert_eq!(row.status, EnrollmentStatus::Completed);
        assert_eq!(row.next_email_at, None);

        let third = uc.execute().await.unwrap();
        assert_eq!(third, DispatchSummary::default());
        assert_eq!(uc.mailer.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_cap_batch_size() {
        let repo = MockEnrollmentRepo::default();
        for i in 0..5 {
            enroll(
                &repo,
                &format!("u{i}@example.com"),
                SequenceType::WelcomeSeries,
                json!({}),
            )
            .await;
        }
        let mut uc = loop_over(repo, MockActionLog::default(), MockMailer::default());
        uc.batch_size = 3;

        let summary = uc.execute().await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.processed, 3);
    }
}
