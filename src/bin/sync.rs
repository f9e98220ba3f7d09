use anyhow::Result;
use macpicker::{config::Config, feed::HttpFeedSource, sync::run_sync};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let source = HttpFeedSource::from_config(&config);
    let (catalog, report) = run_sync(&source, config.catalog_path()).await?;

    println!(
        "published {} of {} items to {} (last updated {})",
        report.published,
        report.fetched,
        config.catalog_path().display(),
        catalog.last_updated.to_rfc3339()
    );
    Ok(())
}
