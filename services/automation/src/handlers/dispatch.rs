use axum::{Json, extract::State, response::IntoResponse};

use crate::error::AutomationServiceError;
use crate::state::AppState;
use crate::usecase::dispatch::ProcessDueEmailsUseCase;

// ── POST /internal/dispatch ───────────────────────────────────────────────────

/// Run one batch of due-email processing. Invoked by the scheduler (cron or
/// an operator), not by end users.
pub async fn run_dispatch(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let usecase = ProcessDueEmailsUseCase {
        enrollments: state.enrollment_repo(),
        events: state.event_repo(),
        actions: state.action_log(),
        mailer: state.mailer.clone(),
        batch_size: state.dispatch_batch_size,
    };
    let summary = usecase.execute().await?;
    Ok(Json(summary))
}
