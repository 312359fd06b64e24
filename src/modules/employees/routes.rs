use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    add_employee, delete_employee, list_employees, update_employee, verify_invite,
};
use crate::app_state::AppState;

pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(add_employee))
        .route("/employees/verify-invite/{token}", post(verify_invite))
        .route(
            "/employees/{id}",
            put(update_employee).delete(delete_employee),
        )
}
