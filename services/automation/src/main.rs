use sea_orm::Database;
use tracing::info;

use lexflow_automation::config::{AutomationConfig, Config};
use lexflow_automation::infra::mailer::HttpMailer;
use lexflow_automation::router::build_router;
use lexflow_automation::state::AppState;

#[tokio::main]
async fn main() {
    lexflow_core::tracing::init_tracing();

    let config = AutomationConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let mailer = HttpMailer::from_config(&config);

    let state = AppState {
        db,
        mailer,
        dispatch_batch_size: config.dispatch_batch_size,
        webhook_stale_after_minutes: config.webhook_stale_after_minutes,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.automation_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("automation service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
