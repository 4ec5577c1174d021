use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{info, warn};

use activity_board::config::BoardConfig;
use activity_board::services::activities_api_service::HttpActivitiesApi;
use activity_board::services::board_service::ActivityBoard;
use activity_board::web;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt::init();

    // 2. Configuration and the upstream activities service
    let config = BoardConfig::from_env().expect("invalid board configuration");
    let api = HttpActivitiesApi::from_config(&config).expect("cannot build activities client");
    info!("Activities service: {}", api.base_url());

    // 3. The board and its routes
    let board = Arc::new(
        ActivityBoard::new(
            Arc::new(api),
            config.anchors.clone(),
            config.message_hide_after,
        )
        .with_visitor_idle_ttl(config.visitor_idle_ttl),
    );
    let app = web::router(board, &config.assets_dir);

    // 4. Bind, falling back to the next port when the configured one is taken
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("cannot parse HOST/PORT");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback_port = config.port.wrapping_add(1);
            warn!(
                "Could not bind {}: {}. Trying fallback {}:{}",
                addr, e, config.host, fallback_port
            );
            let fallback: SocketAddr = format!("{}:{}", config.host, fallback_port)
                .parse()
                .expect("cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().expect("listener has no local address");
    println!("Activity board running on http://{}/board", bound_addr);

    axum::serve(listener, app).await.expect("server error");
}
