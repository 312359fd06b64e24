use axum::{
    routing::{get, put},
    Router,
};

use super::handlers::{create_enrollment, list_enrollments, update_enrollment_status};
use crate::app_state::AppState;

pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/enrollments", get(list_enrollments).post(create_enrollment))
        .route("/enrollments/{id}", put(update_enrollment_status))
}
