// libs/analytics-cell/src/router.rs
use axum::{routing::get, Router};

use shared_database::StoreHandle;

use crate::handlers;

pub fn analytics_routes(store: StoreHandle) -> Router {
    Router::new()
        .route("/", get(handlers::get_dashboard))
        .with_state(store)
}
