use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use lexflow_domain::sequence::SequenceType;

use crate::error::AutomationServiceError;
use crate::state::AppState;
use crate::usecase::analytics::SequenceAnalyticsUseCase;

// ── GET /sequences/{sequence_type}/analytics ──────────────────────────────────

pub async fn sequence_analytics(
    State(state): State<AppState>,
    Path(sequence_type): Path<String>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let sequence_type =
        SequenceType::parse(&sequence_type).ok_or(AutomationServiceError::UnknownSequence)?;
    let usecase = SequenceAnalyticsUseCase {
        enrollments: state.enrollment_repo(),
        events: state.event_repo(),
    };
    let analytics = usecase.execute(sequence_type).await?;
    Ok(Json(analytics))
}
