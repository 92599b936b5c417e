//! Coursebook Store - loyalty and order rules service

use anyhow::{Context, Result};
use coursebook_store::{api, config::AppConfig, db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(url) = config.database_url.as_deref() {
        let pool = db::connect(url).await.context("connecting to database")?;
        db::run_migrations(&pool).await?;
        let settings = db::load_loyalty_settings(&pool).await?;
        tracing::info!(rows = settings.len(), "loyalty settings loaded");
        config.loyalty.apply(&settings).context("applying settings table")?;
    }

    let tiers = config.loyalty.tier_table()?;
    for tier in tiers.tiers() {
        tracing::info!(tier = %tier.name, min_points = tier.min_points, discount = %tier.discount_percent, "loyalty tier");
    }
    let app = api::router(api::AppState::new(tiers, config.loyalty.points));

    tracing::info!("🚀 Coursebook Store listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
