//! Coffee shop backend: menu, orders and status checks over `/api`, plus
//! chat and search agents backed by an LLM.
//!
//! Default: http://0.0.0.0:8001/api/

mod agents;
mod config;
mod error;
mod http;
mod routes;
mod seed;
mod store;

use std::sync::Arc;

use agents::{AgentConfig, Agents};
use config::Config;
use routes::AppState;
use store::Store;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let store = Store::connect(&config);
    log::info!("Using {} storage", store.backend_name());

    if let Err(e) = seed::seed_menu(&store) {
        log::error!("Failed to seed menu: {}", e);
    }

    let agents = Agents::from_config(&AgentConfig::from_env());
    let state = Arc::new(AppState::new(store, agents));
    let app = routes::router(state.clone());

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            state.store.close();
            std::process::exit(1);
        }
    };
    log::info!("Coffee backend listening on http://{}/api/", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        log::error!("Server error: {}", e);
    }

    state.store.close();
    log::info!("Shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    log::info!("Shutdown signal received");
}
