use auto_extract::{AutoExtractor, Config, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let extractor = AutoExtractor::with_default_notifier(Config::default())?;
    run_with_shutdown(extractor).await?;
    Ok(())
}
