use std::error::Error;

use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bus_router::cache::CachedArrivalClient;
use bus_router::config::ServerConfig;
use bus_router::ingest::{IngestConfig, run_ingestion};
use bus_router::lta::LtaClient;
use bus_router::reducer::NetworkReducer;
use bus_router::store::MemoryStore;
use bus_router::web::{AppState, create_router};

const USAGE: &str = "usage: bus-router [serve|ingest|reduce]";

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logger();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "serve".to_string());
    let config = ServerConfig::from_env()?;

    match mode.as_str() {
        "serve" => serve(config).await,
        "ingest" => ingest(config).await,
        "reduce" => reduce(config).await,
        other => {
            eprintln!("unknown mode {other:?}\n{USAGE}");
            std::process::exit(2);
        }
    }
}

/// Fetch the whole network from DataMall and write a fresh snapshot.
async fn ingest(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    let client = LtaClient::new(config.lta)?;
    let store = MemoryStore::new();

    let summary = run_ingestion(&client, &store, &IngestConfig::default()).await?;
    store.save(&config.data_path).await?;
    info!(
        path = %config.data_path.display(),
        stops = summary.stops,
        services = summary.services,
        segments = summary.segments,
        hub_to_hub = summary.reduction.hub_to_hub_segments,
        "ingestion complete"
    );
    Ok(())
}

/// Regenerate the aggregates of an existing snapshot.
async fn reduce(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::open(&config.data_path)?;
    let summary = NetworkReducer::new(&store).run().await?;
    store.save(&config.data_path).await?;
    info!(
        reduced = summary.services_reduced,
        skipped = summary.services_skipped,
        "reduction complete"
    );
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    let store = if config.data_path.exists() {
        MemoryStore::open(&config.data_path)?
    } else {
        warn!(
            path = %config.data_path.display(),
            "no network snapshot; serving an empty network until `ingest` runs"
        );
        MemoryStore::new()
    };
    let stats = store.stats().await;
    info!(
        stops = stats.stops,
        services = stats.services,
        segments = stats.segments,
        "network loaded"
    );

    let client = LtaClient::new(config.lta.clone())?;
    let arrivals = CachedArrivalClient::new(client, &config.arrival_cache);
    let state = AppState::new(store, arrivals, config.planner.clone());
    let app = create_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("bus-router listening on http://{addr}");
    info!("  GET /health     - Health check");
    info!("  GET /findroute  - Find a route between two coordinates");

    axum::serve(listener, app).await?;
    Ok(())
}
