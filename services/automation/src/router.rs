use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use lexflow_core::health::{healthz, readyz};
use lexflow_core::middleware::request_id_layer;

use crate::handlers::{
    analytics::sequence_analytics,
    dispatch::run_dispatch,
    enrollment::{create_enrollment, pause_enrollment, remove_enrollment, resume_enrollment},
    events::record_event,
    webhook::receive_webhook,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Webhooks
        .route("/webhooks/{provider}", post(receive_webhook))
        // Enrollments
        .route("/sequences/enrollments", post(create_enrollment))
        .route("/sequences/enrollments", delete(remove_enrollment))
        .route("/sequences/enrollments/pause", patch(pause_enrollment))
        .route("/sequences/enrollments/resume", patch(resume_enrollment))
        // Engagement events and analytics
        .route("/sequences/events", post(record_event))
        .route("/sequences/{sequence_type}/analytics", get(sequence_analytics))
        // Scheduler entry point
        .route("/internal/dispatch", post(run_dispatch))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
