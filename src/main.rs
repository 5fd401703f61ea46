//! Realtime relay for shared pixel boards.
//!
//! Clients connect to `/ws/{room}`, receive the room's snapshot, and from
//! then on every pixel write and selected-color change made by any member.

mod config;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;

use config::RelayConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = RelayConfig::from_env().expect("invalid relay configuration");
    let state = AppState::new(config.outbox_capacity);
    let app = routes::app(state);

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind");
    tracing::info!(%addr, "relay listening");
    axum::serve(listener, app).await.expect("server failed");
}
