//! REST API Server for ZIP referral routing
//!
//! Usage:
//!   ./target/release/api_server [--port PORT] [--db-path PATH] [--log-level LEVEL]
//!
//! REST endpoints:
//!   GET  /api/v1/health                   - Health check
//!   GET  /api/v1/locations/by-zip?zip=N   - Resolve a 5-digit ZIP
//!   GET  /api/v1/locations/by-zip/:zip    - Same, ZIP in the path
//!   GET  /api/v1/zip-map                  - Sites + current ZIP map for the editor
//!   POST /api/v1/zip-assignments          - Submit an edited ZIP map

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use zip_referral::api::{create_rest_router, LocationService};
use zip_referral::config::{init_tracing, ServerConfig};
use zip_referral::db::{self, SurrealStore};

fn print_banner(config: &ServerConfig) {
    println!("============================================================");
    println!("              ZIP REFERRAL API SERVER");
    println!("============================================================");
    println!();
    println!("  Port:     {}", config.port);
    println!("  Database: {}", config.db_path);
    println!("  REST:     http://localhost:{}/api/v1/", config.port);
    println!();
    println!("REST Endpoints:");
    println!("  GET  /api/v1/health                 Health check");
    println!("  GET  /api/v1/locations/by-zip?zip=  ZIP lookup");
    println!("  GET  /api/v1/locations/by-zip/:zip  ZIP lookup");
    println!("  GET  /api/v1/zip-map                Map editor snapshot");
    println!("  POST /api/v1/zip-assignments        Apply map edits");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_tracing(&config.log_level);

    print_banner(&config);

    let conn = db::connect(&config.db_path).await?;
    db::init_schema(&conn).await?;
    let service = Arc::new(LocationService::new(SurrealStore::new(conn)));

    // Warm the index so the first lookup doesn't pay for the scan
    let index = service.index().await?;
    tracing::info!("Serving {} locations", index.len());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let app = create_rest_router(service);
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
