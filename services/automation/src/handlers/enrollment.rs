use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use lexflow_domain::sequence::SequenceType;

use crate::error::AutomationServiceError;
use crate::state::AppState;
use crate::usecase::enroll::{
    EnrollInput, EnrollUseCase, PauseUseCase, RemoveUseCase, ResumeUseCase,
};

fn parse_sequence_type(raw: &str) -> Result<SequenceType, AutomationServiceError> {
    SequenceType::parse(raw).ok_or(AutomationServiceError::UnknownSequence)
}

// ── POST /sequences/enrollments ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EnrollRequest {
    pub email: String,
    pub sequence_type: String,
    #[serde(default)]
    pub trigger_data: serde_json::Value,
}

#[derive(Serialize)]
pub struct EnrollResponse {
    pub enrollment_id: uuid::Uuid,
    #[serde(serialize_with = "lexflow_core::serde::opt_to_rfc3339_ms")]
    pub next_email_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn create_enrollment(
    State(state): State<AppState>,
    Json(body): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let sequence_type = parse_sequence_type(&body.sequence_type)?;
    let usecase = EnrollUseCase {
        repo: state.enrollment_repo(),
    };
    let enrollment = usecase
        .execute(EnrollInput {
            email: body.email,
            sequence_type,
            trigger_data: body.trigger_data,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(EnrollResponse {
            enrollment_id: enrollment.id,
            next_email_at: enrollment.next_email_at,
        }),
    ))
}

// ── DELETE /sequences/enrollments ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RemoveRequest {
    pub email: String,
    pub sequence_type: String,
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "removed".to_owned()
}

pub async fn remove_enrollment(
    State(state): State<AppState>,
    Json(body): Json<RemoveRequest>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let sequence_type = parse_sequence_type(&body.sequence_type)?;
    let usecase = RemoveUseCase {
        repo: state.enrollment_repo(),
    };
    usecase.execute(&body.email, sequence_type, &body.reason).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PATCH /sequences/enrollments/{pause,resume} ───────────────────────────────

#[derive(Deserialize)]
pub struct StatusRequest {
    pub email: String,
    pub sequence_type: String,
}

pub async fn pause_enrollment(
    State(state): State<AppState>,
    Json(body): Json<StatusRequest>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let sequence_type = parse_sequence_type(&body.sequence_type)?;
    let usecase = PauseUseCase {
        repo: state.enrollment_repo(),
    };
    usecase.execute(&body.email, sequence_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resume_enrollment(
    State(state): State<AppState>,
    Json(body): Json<StatusRequest>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    let sequence_type = parse_sequence_type(&body.sequence_type)?;
    let usecase = ResumeUseCase {
        repo: state.enrollment_repo(),
    };
    usecase.execute(&body.email, sequence_type).await?;
    Ok(StatusCode::NO_CONTENT)
}
