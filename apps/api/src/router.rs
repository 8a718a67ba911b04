use axum::{routing::get, Router};

use analytics_cell::router::analytics_routes;
use appointment_cell::router::appointment_routes;
use consultation_cell::router::consultation_routes;
use shared_database::StoreHandle;

pub fn create_router(store: StoreHandle) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic records API is running!" }))
        .nest("/dashboard", analytics_routes(store.clone()))
        .nest("/appointments", appointment_routes(store.clone()))
        .nest("/consultations", consultation_routes(store))
}
