//! Wipe the configured store and load the demo fleet.

use anyhow::Context;

use firefleet_api::{bootstrap, config::Config, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    firefleet_observability::init(config.log_format);

    let services = bootstrap::services_from_config(&config).await?;
    if config.database_url.is_none() {
        tracing::warn!("no database_url configured; seeding an in-memory store that exits with this process");
    }

    let summary = seed::seed_demo_data(&services).await?;
    tracing::info!(
        managers = summary.managers,
        drivers = summary.drivers,
        stations = summary.stations,
        vehicles = summary.vehicles,
        faults = summary.faults,
        "seed complete"
    );
    tracing::info!(
        managers = "amir1@itfaiye.gov.tr, amir2@itfaiye.gov.tr",
        manager_password = seed::MANAGER_PASSWORD,
        driver_password = seed::DRIVER_PASSWORD,
        "demo logins"
    );
    Ok(())
}
