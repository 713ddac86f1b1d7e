use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use lexflow_automation_schema::{
    sequence_enrollments, sequence_events, subscriber_actions, webhook_events,
};
use lexflow_domain::action::ActionTag;
use lexflow_domain::sequence::SequenceType;
use lexflow_domain::status::{EnrollmentStatus, SequenceEventType, WebhookStatus};

use crate::domain::repository::{
    ActionLogPort, EnrollmentRepository, SequenceEventRepository, WebhookEventRepository,
};
use crate::domain::types::{
    ClaimOutcome, Enrollment, EnrollmentCounts, EventCounts, SequenceEvent,
};
use crate::error::AutomationServiceError;

// ── Webhook event repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbWebhookEventRepository {
    pub db: DatabaseConnection,
}

impl WebhookEventRepository for DbWebhookEventRepository {
    async fn claim(
        &self,
        provider: &str,
        event_id: &str,
        event_type: &str,
        stale_after: Duration,
    ) -> Result<ClaimOutcome, AutomationServiceError> {
        let now = Utc::now();
        let inserted = webhook_events::Entity::insert(webhook_events::ActiveModel {
            id: Set(Uuid::now_v7()),
            provider: Set(provider.to_owned()),
            event_id: Set(event_id.to_owned()),
            event_type: Set(event_type.to_owned()),
            status: Set(WebhookStatus::Processing.as_i16()),
            created_at: Set(now),
            completed_at: Set(None),
        })
        .on_conflict(
            OnConflict::columns([
                webhook_events::Column::Provider,
                webhook_events::Column::EventId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("claim webhook event")?;
        if inserted == 1 {
            return Ok(ClaimOutcome::Claimed);
        }

        // The key exists. Failed rows and stale processing rows (a crashed
        // attempt) are reclaimable; the guarded update lets exactly one
        // caller win the reclaim.
        let stale_cutoff = now - stale_after;
        let reclaimed = webhook_events::Entity::update_many()
            .col_expr(
                webhook_events::Column::Status,
                Expr::value(WebhookStatus::Processing.as_i16()),
            )
            .col_expr(webhook_events::Column::CreatedAt, Expr::value(now))
            .col_expr(
                webhook_events::Column::CompletedAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(webhook_events::Column::Provider.eq(provider))
            .filter(webhook_events::Column::EventId.eq(event_id))
            .filter(
                Condition::any()
                    .add(webhook_events::Column::Status.eq(WebhookStatus::Failed.as_i16()))
                    .add(
                        Condition::all()
                            .add(
                                webhook_events::Column::Status
                                    .eq(WebhookStatus::Processing.as_i16()),
                            )
                            .add(webhook_events::Column::CreatedAt.lt(stale_cutoff)),
                    ),
            )
            .exec(&self.db)
            .await
            .context("reclaim webhook event")?;

        if reclaimed.rows_affected == 1 {
            Ok(ClaimOutcome::Claimed)
        } else {
            Ok(ClaimOutcome::Duplicate)
        }
    }

    async fn mark_processed(
        &self,
        provider: &str,
        event_id: &str,
    ) -> Result<(), AutomationServiceError> {
        self.set_status(provider, event_id, WebhookStatus::Processed)
            .await
    }

    async fn mark_failed(
        &self,
        provider: &str,
        event_id: &str,
    ) -> Result<(), AutomationServiceError> {
        self.set_status(provider, event_id, WebhookStatus::Failed)
            .await
    }
}

impl DbWebhookEventRepository {
    async fn set_status(
        &self,
        provider: &str,
        event_id: &str,
        status: WebhookStatus,
    ) -> Result<(), AutomationServiceError> {
        webhook_events::Entity::update_many()
            .col_expr(webhook_events::Column::Status, Expr::value(status.as_i16()))
            .col_expr(
                webhook_events::Column::CompletedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(webhook_events::Column::Provider.eq(provider))
            .filter(webhook_events::Column::EventId.eq(event_id))
            .exec(&self.db)
            .await
            .context("update webhook event status")?;
        Ok(())
    }
}

// ── Enrollment repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEnrollmentRepository {
    pub db: DatabaseConnection,
}

impl EnrollmentRepository for DbEnrollmentRepository {
    async fn create(&self, enrollment: &Enrollment) -> Result<(), AutomationServiceError> {
        let result = sequence_enrollments::ActiveModel {
            id: Set(enrollment.id),
            email: Set(enrollment.email.clone()),
            sequence_type: Set(enrollment.sequence_type.as_i16()),
            current_step: Set(enrollment.current_step as i32),
            status: Set(enrollment.status.as_i16()),
            trigger_data: Set(enrollment.trigger_data.clone()),
            metadata: Set(enrollment.metadata.clone()),
            started_at: Set(enrollment.started_at),
            next_email_at: Set(enrollment.next_email_at),
            last_email_sent_at: Set(enrollment.last_email_sent_at),
            completed_at: Set(enrollment.completed_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            // The partial unique index on outstanding (email, sequence_type).
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(AutomationServiceError::AlreadyEnrolled)
                }
                _ => Err(anyhow::Error::new(e).context("create enrollment").into()),
            },
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>, AutomationServiceError> {
        let model = sequence_enrollments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find enrollment by id")?;
        model.map(enrollment_from_model).transpose()
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Enrollment>, AutomationServiceError> {
        let models = sequence_enrollments::Entity::find()
            .filter(
                sequence_enrollments::Column::Status.eq(EnrollmentStatus::Active.as_i16()),
            )
            .filter(sequence_enrollments::Column::NextEmailAt.lte(now))
            .order_by_asc(sequence_enrollments::Column::NextEmailAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list due enrollments")?;
        models.into_iter().map(enrollment_from_model).collect()
    }

    async fn advance(
        &self,
        id: Uuid,
        expected_step: u32,
        next_step: u32,
        next_email_at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let result = sequence_enrollments::Entity::update_many()
            .col_expr(
                sequence_enrollments::Column::CurrentStep,
                Expr::value(next_step as i32),
            )
            .col_expr(
                sequence_enrollments::Column::NextEmailAt,
                Expr::value(Some(next_email_at)),
            )
            .filter(sequence_enrollments::Column::Id.eq(id))
            .filter(
                sequence_enrollments::Column::Status.eq(EnrollmentStatus::Active.as_i16()),
            )
            .filter(sequence_enrollments::Column::CurrentStep.eq(expected_step as i32))
            .exec(&self.db)
            .await
            .context("advance enrollment")?;
        Ok(result.rows_affected == 1)
    }

    async fn complete(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let result = sequence_enrollments::Entity::update_many()
            .col_expr(
                sequence_enrollments::Column::Status,
                Expr::value(EnrollmentStatus::Completed.as_i16()),
            )
            .col_expr(
                sequence_enrollments::Column::CompletedAt,
                Expr::value(Some(completed_at)),
            )
            .col_expr(
                sequence_enrollments::Column::NextEmailAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(sequence_enrollments::Column::Id.eq(id))
            .filter(
                sequence_enrollments::Column::Status.eq(EnrollmentStatus::Active.as_i16()),
            )
            .exec(&self.db)
            .await
            .context("complete enrollment")?;
        Ok(result.rows_affected == 1)
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AutomationServiceError> {
        sequence_enrollments::Entity::update_many()
            .col_expr(
                sequence_enrollments::Column::LastEmailSentAt,
                Expr::value(Some(sent_at)),
            )
            .filter(sequence_enrollments::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark enrollment sent")?;
        Ok(())
    }

    async fn cancel(
        &self,
        email: &str,
        sequence_type: SequenceType,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let model = sequence_enrollments::Entity::find()
            .filter(sequence_enrollments::Column::Email.eq(email))
            .filter(sequence_enrollments::Column::SequenceType.eq(sequence_type.as_i16()))
            .filter(sequence_enrollments::Column::Status.is_in(outstanding_codes()))
            .one(&self.db)
            .await
            .context("find outstanding enrollment")?;
        match model {
            Some(model) => self.cancel_model(model, reason, at).await,
            None => Ok(false),
        }
    }

    async fn cancel_by_id(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let model = sequence_enrollments::Entity::find_by_id(id)
            .filter(sequence_enrollments::Column::Status.is_in(outstanding_codes()))
            .one(&self.db)
            .await
            .context("find enrollment for cancel")?;
        match model {
            Some(model) => self.cancel_model(model, reason, at).await,
            None => Ok(false),
        }
    }

    async fn set_status(
        &self,
        email: &str,
        sequence_type: SequenceType,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, AutomationServiceError> {
        let result = sequence_enrollments::Entity::update_many()
            .col_expr(
                sequence_enrollments::Column::Status,
                Expr::value(to.as_i16()),
            )
            .filter(sequence_enrollments::Column::Email.eq(email))
            .filter(sequence_enrollments::Column::SequenceType.eq(sequence_type.as_i16()))
            .filter(sequence_enrollments::Column::Status.eq(from.as_i16()))
            .exec(&self.db)
            .await
            .context("set enrollment status")?;
        Ok(result.rows_affected == 1)
    }

    async fn count_by_status(
        &self,
        sequence_type: SequenceType,
    ) -> Result<EnrollmentCounts, AutomationServiceError> {
        #[derive(Debug, FromQueryResult)]
        struct StatusCount {
            status: i16,
            count: i64,
        }

        let rows = sequence_enrollments::Entity::find()
            .select_only()
            .column(sequence_enrollments::Column::Status)
            .column_as(sequence_enrollments::Column::Id.count(), "count")
            .filter(sequence_enrollments::Column::SequenceType.eq(sequence_type.as_i16()))
            .group_by(sequence_enrollments::Column::Status)
            .into_model::<StatusCount>()
            .all(&self.db)
            .await
            .context("count enrollments by status")?;

        let mut counts = EnrollmentCounts::default();
        for row in rows {
            let n = row.count as u64;
            counts.total += n;
            match EnrollmentStatus::from_i16(row.status) {
                Some(EnrollmentStatus::Active) => counts.active += n,
                Some(EnrollmentStatus::Paused) => counts.paused += n,
                Some(EnrollmentStatus::Completed) => counts.completed += n,
                Some(EnrollmentStatus::Cancelled) => counts.cancelled += n,
                None => {}
            }
        }
        Ok(counts)
    }
}

impl DbEnrollmentRepository {
    /// Guarded terminal write: the status filter keeps a concurrent cancel
    /// or completion from being double-applied.
    async fn cancel_model(
        &self,
        model: sequence_enrollments::Model,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AutomationServiceError> {
        let mut metadata = model.metadata.clone();
        if let Some(obj) = metadata.as_object_mut() {
            obj.insert(
                "cancellation_reason".to_owned(),
                serde_json::Value::String(reason.to_owned()),
            );
        }
        let result = sequence_enrollments::Entity::update_many()
            .col_expr(
                sequence_enrollments::Column::Status,
                Expr::value(EnrollmentStatus::Cancelled.as_i16()),
            )
            .col_expr(
                sequence_enrollments::Column::CompletedAt,
                Expr::value(Some(at)),
            )
            .col_expr(
                sequence_enrollments::Column::NextEmailAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(
                sequence_enrollments::Column::Metadata,
                Expr::value(metadata),
            )
            .filter(sequence_enrollments::Column::Id.eq(model.id))
            .filter(sequence_enrollments::Column::Status.is_in(outstanding_codes()))
            .exec(&self.db)
            .await
            .context("cancel enrollment")?;
        Ok(result.rows_affected == 1)
    }
}

fn outstanding_codes() -> [i16; 2] {
    [
        EnrollmentStatus::Active.as_i16(),
        EnrollmentStatus::Paused.as_i16(),
    ]
}

fn enrollment_from_model(
    model: sequence_enrollments::Model,
) -> Result<Enrollment, AutomationServiceError> {
    let sequence_type = SequenceType::from_i16(model.sequence_type)
        .with_context(|| format!("unknown sequence type code {}", model.sequence_type))?;
    let status = EnrollmentStatus::from_i16(model.status)
        .with_context(|| format!("unknown enrollment status code {}", model.status))?;
    Ok(Enrollment {
        id: model.id,
        email: model.email,
        sequence_type,
        current_step: model.current_step as u32,
        status,
        trigger_data: model.trigger_data,
        metadata: model.metadata,
        started_at: model.started_at,
        next_email_at: model.next_email_at,
        last_email_sent_at: model.last_email_sent_at,
        completed_at: model.completed_at,
    })
}

// ── Sequence event repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSequenceEventRepository {
    pub db: DatabaseConnection,
}

impl SequenceEventRepository for DbSequenceEventRepository {
    async fn record(&self, event: &SequenceEvent) -> Result<(), AutomationServiceError> {
        sequence_events::ActiveModel {
            id: Set(event.id),
            enrollment_id: Set(event.enrollment_id),
            sequence_type: Set(event.sequence_type.as_i16()),
            event_type: Set(event.event_type.as_i16()),
            metadata: Set(event.metadata.clone()),
            created_at: Set(event.created_at),
        }
        .insert(&self.db)
        .await
        .context("record sequence event")?;
        Ok(())
    }

    async fn count_by_type(
        &self,
        sequence_type: SequenceType,
    ) -> Result<EventCounts, AutomationServiceError> {
        #[derive(Debug, FromQueryResult)]
        struct EventCount {
            event_type: i16,
            count: i64,
        }

        let rows = sequence_events::Entity::find()
            .select_only()
            .column(sequence_events::Column::EventType)
            .column_as(sequence_events::Column::Id.count(), "count")
            .filter(sequence_events::Column::SequenceType.eq(sequence_type.as_i16()))
            .group_by(sequence_events::Column::EventType)
            .into_model::<EventCount>()
            .all(&self.db)
            .await
            .context("count sequence events")?;

        let mut counts = EventCounts::default();
        for row in rows {
            let n = row.count as u64;
            match SequenceEventType::from_i16(row.event_type) {
                Some(SequenceEventType::Sent) => counts.sent += n,
                Some(SequenceEventType::Opened) => counts.opened += n,
                Some(SequenceEventType::Clicked) => counts.clicked += n,
                _ => {}
            }
        }
        Ok(counts)
    }
}

// ── Action log ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbActionLogRepository {
    pub db: DatabaseConnection,
}

impl ActionLogPort for DbActionLogRepository {
    async fn actions(
        &self,
        email: &str,
    ) -> Result<std::collections::HashSet<ActionTag>, AutomationServiceError> {
        let models = subscriber_actions::Entity::find()
            .filter(subscriber_actions::Column::Email.eq(email))
            .all(&self.db)
            .await
            .context("list subscriber actions")?;
        Ok(models
            .into_iter()
            .filter_map(|m| ActionTag::from_i16(m.action))
            .collect())
    }

    async fn record(&self, email: &str, action: ActionTag) -> Result<(), AutomationServiceError> {
        subscriber_actions::Entity::insert(subscriber_actions::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_owned()),
            action: Set(action.as_i16()),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([
                subscriber_actions::Column::Email,
                subscriber_actions::Column::Action,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("record subscriber action")?;
        Ok(())
    }
}
