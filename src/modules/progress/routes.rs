use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_progress, record_progress};
use crate::app_state::AppState;

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/progress", post(record_progress))
        .route("/progress/{enrollment_id}", get(get_progress))
}
