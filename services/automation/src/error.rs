use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Automation service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AutomationServiceError {
    #[error("unknown sequence type")]
    UnknownSequence,
    #[error("sequence is inactive")]
    SequenceInactive,
    #[error("already enrolled")]
    AlreadyEnrolled,
    #[error("enrollment not found")]
    EnrollmentNotFound,
    #[error("invalid email")]
    InvalidEmail,
    #[error("missing data")]
    MissingData,
    #[error("mailer failure: {0}")]
    MailerFailure(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AutomationServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownSequence => "UNKNOWN_SEQUENCE",
            Self::SequenceInactive => "SEQUENCE_INACTIVE",
            Self::AlreadyEnrolled => "ALREADY_ENROLLED",
            Self::EnrollmentNotFound => "ENROLLMENT_NOT_FOUND",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::MissingData => "MISSING_DATA",
            Self::MailerFailure(_) => "MAILER_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AutomationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownSequence | Self::EnrollmentNotFound => StatusCode::NOT_FOUND,
            Self::SequenceInactive => StatusCode::UNPROCESSABLE_ENTITY,
            // Expected outcome under retries, not a server failure.
            Self::AlreadyEnrolled => StatusCode::CONFLICT,
            Self::InvalidEmail | Self::MissingData => StatusCode::BAD_REQUEST,
            // 5xx so upstream providers retry transient dispatch failures.
            Self::MailerFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
