use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbActionLogRepository, DbEnrollmentRepository, DbSequenceEventRepository,
    DbWebhookEventRepository,
};
use crate::infra::mailer::HttpMailer;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: HttpMailer,
    pub dispatch_batch_size: u64,
    pub webhook_stale_after_minutes: i64,
}

impl AppState {
    pub fn webhook_repo(&self) -> DbWebhookEventRepository {
        DbWebhookEventRepository {
            db: self.db.clone(),
        }
    }

    pub fn enrollment_repo(&self) -> DbEnrollmentRepository {
        DbEnrollmentRepository {
            db: self.db.clone(),
        }
    }

    pub fn event_repo(&self) -> DbSequenceEventRepository {
        DbSequenceEventRepository {
            db: self.db.clone(),
        }
    }

    pub fn action_log(&self) -> DbActionLogRepository {
        DbActionLogRepository {
            db: self.db.clone(),
        }
    }

    pub fn webhook_stale_after(&self) -> Duration {
        Duration::minutes(self.webhook_stale_after_minutes)
    }
}
