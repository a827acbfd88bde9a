use std::sync::Arc;

use anyhow::Context;

use firefleet_api::{app, bootstrap, config::Config, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    firefleet_observability::init(config.log_format);

    let services = Arc::new(bootstrap::services_from_config(&config).await?);
    if config.seed_on_start {
        let summary = seed::seed_demo_data(&services).await?;
        tracing::info!(vehicles = summary.vehicles, "seeded demo data on start");
    }

    let app = app::build_app(services, config.cors_origin_list());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
