pub mod client;
pub mod error;
pub mod filters;
pub mod memory;
pub mod postgrest;
pub mod store;

use std::sync::Arc;

use tracing::{info, warn};

use shared_config::{AppConfig, StoreBackend};

pub use error::StoreError;
pub use filters::{AppointmentFilter, FactFilter};
pub use memory::{MemoryStore, SeedData};
pub use postgrest::PostgrestStore;
pub use store::{RecordStore, StoreHandle};

/// Builds the store selected by configuration. A PostgREST backend without a
/// URL falls back to an empty in-memory store.
pub fn connect(config: &AppConfig, seed: SeedData) -> StoreHandle {
    match config.store_backend {
        StoreBackend::Postgrest if config.is_configured() => {
            info!("Using PostgREST record store at {}", config.postgrest_url);
            Arc::new(PostgrestStore::new(config))
        }
        StoreBackend::Postgrest => {
            warn!("PostgREST store selected without POSTGREST_URL, falling back to memory");
            Arc::new(MemoryStore::new(seed))
        }
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Arc::new(MemoryStore::new(seed))
        }
    }
}
