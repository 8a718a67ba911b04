// libs/consultation-cell/src/router.rs
use axum::{
    routing::{get, post, put},
    Router,
};

use shared_database::StoreHandle;

use crate::handlers;

pub fn consultation_routes(store: StoreHandle) -> Router {
    Router::new()
        .route("/{doctor}/{timestamp}", get(handlers::get_consultation))
        .route("/{doctor}/{timestamp}/soap/{field}", put(handlers::set_soap_field))
        .route("/{doctor}/{timestamp}/diagnostics", post(handlers::attach_diagnostic))
        .route("/{doctor}/{timestamp}/prescriptions", post(handlers::add_prescription))
        .route("/{doctor}/{timestamp}/nurse", put(handlers::assign_nurse))
        .with_state(store)
}
