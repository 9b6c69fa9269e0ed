use mock_panel::PanelConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8888".to_string());
    let mut config = PanelConfig::default();
    if let Ok(password) = std::env::var("PCA_PASSWORD") {
        config.password = password;
    }
    if let Ok(zones) = std::env::var("PCA_ZONES") {
        config.zones = zones.split(',').map(|z| z.trim().to_lowercase()).collect();
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, zones = ?config.zones, "mock panel listening");
    mock_panel::run(listener, config).await
}
