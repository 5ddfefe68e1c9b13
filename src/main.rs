// --- Portal de materiales de curso - Archivo principal ---

use courseshare::config::Config;
use courseshare::run_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("=== Course material portal (API) ===");
    let config = Config::from_env();
    run_server(config).await
}
