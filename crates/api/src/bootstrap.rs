//! Process startup shared by the server and the seed tool.

use std::sync::Arc;

#[cfg(feature = "postgres")]
use anyhow::Context;
use chrono::Duration;

use firefleet_auth::Hs256Jwt;

use crate::app::services::{AppServices, Collections};
use crate::config::Config;

/// Build the shared services (store backend and token issuer) described by
/// `config`.
pub async fn services_from_config(config: &Config) -> anyhow::Result<AppServices> {
    let jwt = Arc::new(Hs256Jwt::new(
        config.jwt_secret_or_default().as_bytes(),
        Duration::hours(config.jwt_ttl_hours),
    ));
    let db = collections(config).await?;
    Ok(AppServices::new(
        db,
        jwt,
        config.manager_registration_code.clone(),
    ))
}

async fn collections(config: &Config) -> anyhow::Result<Collections> {
    match config.database_url.as_deref().map(str::trim) {
        None | Some("") => {
            tracing::info!("using in-memory store");
            Ok(Collections::in_memory())
        }
        #[cfg(feature = "postgres")]
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to postgres")?;
            firefleet_store::migrate(&pool)
                .await
                .context("failed to migrate postgres schema")?;
            tracing::info!("using postgres store");
            Ok(Collections::postgres(pool))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => anyhow::bail!(
            "database_url is set but firefleet-api was built without the `postgres` feature"
        ),
    }
}
