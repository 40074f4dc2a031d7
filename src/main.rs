//! instance-counter - shared view counter demo service
//!
//! This is the composition root that wires together all the components.

use instance_counter::adapters::inbound::{HttpServer, HttpState};
use instance_counter::adapters::outbound::RedisCounterStore;
use instance_counter::application::CounterService;
use instance_counter::config::{debug_enabled, load_config};
use instance_counter::domain::entities::InstanceInfo;
use instance_counter::domain::ports::StoreConnection;
use instance_counter::infrastructure::{shutdown_signal, PageRenderer, ProcessExit, ShutdownController};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging first so config loading can report what it ignores
    let log_level = if debug_enabled() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    // Load configuration from environment
    let cfg = load_config()?;

    let instance = InstanceInfo::from_env();
    tracing::info!(
        "starting instance-counter index={} listen={}",
        instance.index,
        cfg.listen_addr
    );

    // ===== COMPOSITION ROOT =====

    // 1. Page template; a broken template is a startup failure
    let renderer = PageRenderer::from_file(&cfg.template_path)?;

    // 2. Counter store (Redis), decided once for the process lifetime
    let connection = match &cfg.store {
        Some(store_cfg) => RedisCounterStore::connect(store_cfg).await,
        None => {
            tracing::warn!("no redis service bound, counter disabled");
            StoreConnection::Unavailable
        }
    };

    // 3. Application service
    let counter = Arc::new(CounterService::new(connection));

    // 4. Inbound adapter
    let state = HttpState::new(counter, renderer, instance, Arc::new(ProcessExit));
    let server = HttpServer::new(cfg.listen_addr.clone(), state);

    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    server.run(shutdown).await
}
