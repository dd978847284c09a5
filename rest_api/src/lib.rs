// rest_api/src/lib.rs
use std::net::SocketAddr;

use anyhow::{Context, Error as AnyhowError};
use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use neocare_lib::AppConfig;

pub mod config;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod services;
pub mod state;

pub use errors::{ApiResult, RestApiError};
pub use state::AppState;

use crate::handlers::*;

/// All `/api/v1` routes with CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let api = Router::new()
        .route("/health", get(health_check_handler))
        .route("/auth/login", post(login_handler))
        .route("/portal/login", post(portal_login_handler))
        .route("/portal/child", get(portal_child_handler))
        .route("/hospitals", get(list_hospitals_handler).post(create_hospital_handler))
        .route("/hospitals/:id", delete(delete_hospital_handler))
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/vaccines", get(list_vaccines_handler).post(create_vaccine_handler))
        .route("/vaccines/:id", put(update_vaccine_handler).delete(delete_vaccine_handler))
        .route("/children", get(list_children_handler).post(register_child_handler))
        .route("/children/:id", get(child_detail_handler))
        .route("/children/:id/schedule", get(child_schedule_handler))
        .route(
            "/children/:id/medical-records",
            get(list_medical_records_handler).post(add_medical_record_handler),
        )
        .route("/children/:id/growth", get(growth_chart_handler))
        .route("/schedule/:id/record", post(record_vaccination_handler))
        .route("/growth/percentile", get(percentile_handler))
        .route("/reports/dashboard", get(dashboard_handler))
        .route("/reports/hospital-coverage", get(hospital_coverage_handler))
        .route("/reports/vaccine-coverage", get(vaccine_coverage_handler))
        .route("/reports/registrations", get(registrations_handler))
        .route("/reports/staff-performance", get(staff_performance_handler))
        .route("/reminders/send", post(send_reminders_handler));

    Router::new().nest("/api/v1", api).with_state(state).layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal.");
}

// Main function to start the REST API server
pub async fn start_server(config: AppConfig) -> Result<(), AnyhowError> {
    let (state, dispatcher_handle) = config::build_state(&config).await?;
    let storage = state.storage.clone();

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host/port")?;
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("NeoCare API listening on {}", addr);

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("REST API server failed to start or run")?;

    storage.flush().await.context("Failed to flush storage")?;
    let stats = dispatcher_handle.shutdown().await;
    info!("REST API server stopped; {} SMS delivered, {} failed.", stats.delivered, stats.failed);
    Ok(())
}
