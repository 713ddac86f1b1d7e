//! In-memory repository fakes shared by the usecase tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use lexflow_domain::action::ActionTag;
use lexflow_domain::sequence::SequenceType;
use lexflow_domain::status::EnrollmentStatus;

use crate::domain::repository::{
    ActionLogPort, EnrollmentRepository, MailerPort, SequenceEventRepository,
};
use crate::domain::types::{Enrollment, EnrollmentCounts, EventCounts, SequenceEvent};
use crate::error::AutomationServiceError;

// ── Enrollments ──────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockEnrollmentRepo {
    pub rows: Arc<Mutex<Vec<Enrollment>>>,
}

impl EnrollmentRepository for MockEnrollmentRepo {
    async fn create(&self, enrollment: &Enrollment) -> Result<(), AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let outstanding = rows.iter().any(|r| {
            r.email == enrollment.email
                && r.sequence_type == enrollment.sequence_type
                && !r.status.is_terminal()
        });
        if outstanding {
            return Err(AutomationServiceError::AlreadyEnrolled);
        }
        rows.push(enrollment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>, AutomationServiceError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Enrollment>, AutomationServiceError> {
        let rows = self.rows.lock().unwrap();
        let mut due: Vec<Enrollment> = rows
            .iter()
            .filter(|r| {
                r.status == EnrollmentStatus::Active
                    && r.next_email_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|r| r.next_email_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn advance(
        &self,
        id: Uuid,
        expected_step: u32,
        next_step: u32,
        next_email_at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| {
            r.id == id
                && r.status == EnrollmentStatus::Active
                && r.current_step == expected_step
        }) else {
            return Ok(false);
        };
        row.current_step = next_step;
        row.next_email_at = Some(next_email_at);
        Ok(true)
    }

    async fn complete(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && r.status == EnrollmentStatus::Active)
        else {
            return Ok(false);
        };
        row.status = EnrollmentStatus::Completed;
        row.completed_at = Some(completed_at);
        row.next_email_at = None;
        Ok(true)
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.last_email_sent_at = Some(sent_at);
        }
        Ok(())
    }

    async fn cancel(
        &self,
        email: &str,
        sequence_type: SequenceType,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| {
            r.email == email && r.sequence_type == sequence_type && !r.status.is_terminal()
        }) else {
            return Ok(false);
        };
        cancel_row(row, reason, at);
        Ok(true)
    }

    async fn cancel_by_id(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && !r.status.is_terminal())
        else {
            return Ok(false);
        };
        cancel_row(row, reason, at);
        Ok(true)
    }

    async fn set_status(
        &self,
        email: &str,
        sequence_type: SequenceType,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, AutomationServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.email == email && r.sequence_type == sequence_type && r.status == from)
        else {
            return Ok(false);
        };
        row.status = to;
        Ok(true)
    }

    async fn count_by_status(
        &self,
        sequence_type: SequenceType,
    ) -> Result<EnrollmentCounts, AutomationServiceError> {
        let rows = self.rows.lock().unwrap();
        let mut counts = EnrollmentCounts::default();
        for row in rows.iter().filter(|r| r.sequence_type == sequence_type) {
            counts.total += 1;
            match row.status {
                EnrollmentStatus::Active => counts.active += 1,
                EnrollmentStatus::Paused => counts.paused += 1,
                EnrollmentStatus::Completed => counts.completed += 1,
                EnrollmentStatus::Cancelled => counts.cancelled += 1,
            }
        }
        Ok(counts)
    }
}

fn cancel_row(row: &mut Enrollment, reason: &str, at: DateTime<Utc>) {
    row.status = EnrollmentStatus::Cancelled;
    row.completed_at = Some(at);
    row.next_email_at = None;
    if let Some(obj) = row.metadata.as_object_mut() {
        obj.insert("cancellation_reason".to_owned(), json!(reason));
    }
}

// ── Sequence events ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockEventRepo {
    pub events: Arc<Mutex<Vec<SequenceEvent>>>,
}

impl SequenceEventRepository for MockEventRepo {
    async fn record(&self, event: &SequenceEvent) -> Result<(), AutomationServiceError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn count_by_type(
        &self,
        sequence_type: SequenceType,
    ) -> Result<EventCounts, AutomationServiceError> {
        use lexflow_domain::status::SequenceEventType;
        let events = self.events.lock().unwrap();
        let mut counts = EventCounts::default();
        for event in events.iter().filter(|e| e.sequence_type == sequence_type) {
            match event.event_type {
                SequenceEventType::Sent => counts.sent += 1,
                SequenceEventType::Opened => counts.opened += 1,
                SequenceEventType::Clicked => counts.clicked += 1,
                _ => {}
            }
        }
        Ok(counts)
    }
}

// ── Action log ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockActionLog {
    pub recorded: Arc<Mutex<HashSet<(String, ActionTag)>>>,
}

impl MockActionLog {
    pub fn with_actions(email: &str, tags: &[ActionTag]) -> Self {
        let log = Self::default();
        {
            let mut recorded = log.recorded.lock().unwrap();
            for tag in tags {
                recorded.insert((email.to_owned(), *tag));
            }
        }
        log
    }
}

impl ActionLogPort for MockActionLog {
    async fn actions(&self, email: &str) -> Result<HashSet<ActionTag>, AutomationServiceError> {
        Ok(self
            .recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == email)
            .map(|(_, tag)| *tag)
            .collect())
    }

    async fn record(&self, email: &str, action: ActionTag) -> Result<(), AutomationServiceError> {
        self.recorded
            .lock()
            .unwrap()
            .insert((email.to_owned(), action));
        Ok(())
    }
}

// ── Mailer ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<(String, String, String)>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl MockMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        *mailer.fail.lock().unwrap() = true;
        mailer
    }
}

impl MailerPort for MockMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template_id: &str,
    ) -> Result<(), AutomationServiceError> {
        if *self.fail.lock().unwrap() {
            return Err(AutomationServiceError::MailerFailure(
                "mock mailer down".into(),
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_owned(), subject.to_owned(), template_id.to_owned()));
        Ok(())
    }
}
