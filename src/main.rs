use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crous_finder::CrousFinder;
use crous_finder::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crous_finder=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting CROUS accommodation finder");

    let config = Config::from_env()?;
    info!("Search URL: {}", config.search_url);

    let finder = CrousFinder::new(&config)?;
    finder.run().await;

    Ok(())
}
