//! Product Catalog - file-backed catalog service

use anyhow::Result;
use product_catalog::{api::{build_app, AppState}, config::load_app_config, ProductManager};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?)
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::debug!(?config, "configuration loaded");

    let mut manager = ProductManager::with_policy(&config.products_path, config.load_policy);
    manager.load().await?;
    tracing::info!(policy = %manager.policy(), products = manager.len(), "catalog ready");
    let app = build_app(AppState::new(manager));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("product catalog listening on {}", config.bind_addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal, starting graceful shutdown");
}
