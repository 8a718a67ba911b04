use std::fs;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::AppConfig;
use shared_database::SeedData;

fn load_seed(config: &AppConfig) -> anyhow::Result<SeedData> {
    let Some(path) = config.seed_file.as_deref() else {
        return Ok(SeedData::default());
    };

    let raw = fs::read_to_string(path).with_context(|| format!("reading seed file {}", path))?;
    let seed: SeedData =
        serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path))?;
    info!(
        "Loaded seed: {} doctors, {} clients, {} appointments",
        seed.doctors.len(),
        seed.clients.len(),
        seed.appointments.len()
    );
    Ok(seed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic records API server");

    // Load configuration
    let config = AppConfig::from_env();
    let store = shared_database::connect(&config, load_seed(&config)?);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(store)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
