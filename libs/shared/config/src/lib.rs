use std::env;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgrest,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub postgrest_url: String,
    pub postgrest_api_key: String,
    pub bind_addr: String,
    pub seed_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let store_backend = match env::var("CLINIC_STORE").as_deref() {
            Ok("postgrest") => StoreBackend::Postgrest,
            Ok("memory") => StoreBackend::Memory,
            Ok(other) => {
                warn!("Unknown CLINIC_STORE '{}', using in-memory store", other);
                StoreBackend::Memory
            }
            Err(_) => StoreBackend::Memory,
        };

        let config = Self {
            store_backend,
            postgrest_url: env::var("POSTGREST_URL")
                .unwrap_or_else(|_| {
                    if store_backend == StoreBackend::Postgrest {
                        warn!("POSTGREST_URL not set, using empty value");
                    }
                    String::new()
                }),
            postgrest_api_key: env::var("POSTGREST_API_KEY")
                .unwrap_or_else(|_| {
                    if store_backend == StoreBackend::Postgrest {
                        warn!("POSTGREST_API_KEY not set, using empty value");
                    }
                    String::new()
                }),
            bind_addr: env::var("CLINIC_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_BIND_ADDR not set, using default");
                    "0.0.0.0:3000".to_string()
                }),
            seed_file: env::var("CLINIC_SEED_FILE").ok(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// In-memory configuration used by tests and local runs.
    pub fn in_memory() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            postgrest_url: String::new(),
            postgrest_api_key: String::new(),
            bind_addr: "127.0.0.1:0".to_string(),
            seed_file: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.store_backend {
            StoreBackend::Memory => true,
            StoreBackend::Postgrest => !self.postgrest_url.is_empty(),
        }
    }
}
