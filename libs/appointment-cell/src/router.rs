// libs/appointment-cell/src/router.rs
use axum::{
    routing::{get, post},
    Router,
};

use shared_database::StoreHandle;

use crate::handlers;

pub fn appointment_routes(store: StoreHandle) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/available-doctors", get(handlers::search_available_doctors))
        .route("/clients/{vat}", get(handlers::get_client_appointments))
        .with_state(store)
}
