use axum::{routing::get, Router};

use super::handlers::{issue_certificate, list_certificates, verify_certificate};
use crate::app_state::AppState;

pub fn certificate_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/certificates",
            get(list_certificates).post(issue_certificate),
        )
        .route("/certificates/{certificate_number}", get(verify_certificate))
}
