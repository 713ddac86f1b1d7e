use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use lexflow_domain::action::ActionTag;
use lexflow_domain::sequence::SequenceType;

use crate::domain::repository::ActionLogPort as _;
use crate::error::AutomationServiceError;
use crate::state::AppState;
use crate::usecase::enroll::{EnrollInput, EnrollUseCase};
use crate::usecase::webhook::{ProcessWebhookUseCase, WebhookOutcome};

// ── POST /webhooks/{provider} ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event_id: String,
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<WebhookRequest>,
) -> Result<impl IntoResponse, AutomationServiceError> {
    // Payload shape is checked before the claim: a structurally invalid
    // event 400s without consuming the event id or leaving a failed row.
    let route = route_event(&body.event_type, &body.data)?;

    let gate = ProcessWebhookUseCase {
        events: state.webhook_repo(),
        stale_after: state.webhook_stale_after(),
    };

    let outcome = gate
        .execute(&provider, &body.event_id, &body.event_type, || {
            apply_route(&state, route)
        })
        .await?;

    Ok(Json(WebhookResponse {
        status: match outcome {
            WebhookOutcome::Processed => "processed",
            WebhookOutcome::Duplicate => "duplicate",
        },
    }))
}

/// Side effects one event resolves to.
#[derive(Debug, PartialEq)]
enum EventRoute {
    Enroll {
        email: String,
        sequence_type: SequenceType,
        action: Option<ActionTag>,
        trigger_data: serde_json::Value,
    },
    /// Unknown event types pass the gate as a recorded no-op so provider
    /// retries of irrelevant events stay cheap.
    Ignore,
}

fn route_event(
    event_type: &str,
    data: &serde_json::Value,
) -> Result<EventRoute, AutomationServiceError> {
    let route = |sequence_type, action| {
        Ok(EventRoute::Enroll {
            email: subject_email(data)?,
            sequence_type,
            action,
            trigger_data: data.clone(),
        })
    };
    match event_type {
        "checkout.session.completed" => {
            route(SequenceType::PostPurchase, Some(ActionTag::HasPurchased))
        }
        "booking.created" => route(SequenceType::BookingReminder, Some(ActionTag::HasBooked)),
        "cart.abandoned" => route(SequenceType::CartAbandonment, None),
        "form.submitted" => route(SequenceType::WelcomeSeries, Some(ActionTag::HasSubscribed)),
        _ => {
            tracing::debug!(event_type, "unhandled webhook event type");
            Ok(EventRoute::Ignore)
        }
    }
}

fn subject_email(data: &serde_json::Value) -> Result<String, AutomationServiceError> {
    data.get("email")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or(AutomationServiceError::MissingData)
}

async fn apply_route(
    state: &AppState,
    route: EventRoute,
) -> Result<(), AutomationServiceError> {
    let EventRoute::Enroll {
        email,
        sequence_type,
        action,
        trigger_data,
    } = route
    else {
        return Ok(());
    };

    if let Some(action) = action {
        state.action_log().record(&email, action).await?;
    }

    let usecase = EnrollUseCase {
        repo: state.enrollment_repo(),
    };
    let result = usecase
        .execute(EnrollInput {
            email,
            sequence_type,
            trigger_data,
        })
        .await;
    match result {
        Ok(_) => Ok(()),
        // A retried provider event must not 5xx on the conflict.
        Err(AutomationServiceError::AlreadyEnrolled) => {
            tracing::debug!(
                sequence_type = sequence_type.as_str(),
                "already enrolled, webhook side effect is a no-op"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}
