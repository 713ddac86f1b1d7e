use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;

use lexflow_domain::status::SequenceEventType;

use crate::error::AutomationServiceError;
use crate::state::AppState;
use crate::usecase::events::RecordEngagementUseCase;

// ── POST /sequences/events ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RecordEventRequest {
    pub enrollment_id: Uuid,
    pub event_type: SequenceEventType,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

pub async fn record_event(
    State(state): State<AppState>,
    Json(body): Json<RecordEventRequest>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let usecase = RecordEngagementUseCase {
        enrollments: state.enrollment_repo(),
        events: state.event_repo(),
    };
    usecase
        .execute(body.enrollment_id, body.event_type, body.metadata)
        .await?;
    Ok(StatusCode::CREATED)
}
