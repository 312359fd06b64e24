use axum::{extract::State, middleware, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    app_state::AppState,
    middleware::tracing::observability_middleware,
    modules::{
        certificates::routes::certificate_routes, employees::routes::employee_routes,
        enrollments::routes::enrollment_routes, progress::routes::progress_routes,
    },
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .merge(enrollment_routes())
        .merge(progress_routes())
        .merge(certificate_routes())
        .merge(employee_routes())
        .layer(middleware::from_fn(observability_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn hello() -> &'static str {
    "LMS Backend says hello!\n"
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_result = sqlx::query("SELECT 1").execute(&state.db).await;

    let db_status = match db_result {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::info!("Database health check failed: {}", e);
            "unhealthy"
        }
    };

    let timestamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status
        }
    }))
}
