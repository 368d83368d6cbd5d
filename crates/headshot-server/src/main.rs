use std::sync::Arc;

use headshot_application::{AppContext, BootstrapOptions};
use headshot_infrastructure::logging::{DEFAULT_FILTER, init_tracing};
use headshot_infrastructure::{ConfigService, HeadshotPaths, ServiceType};
use headshot_server::{AppState, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging needs the config (json flag) before the rest is wired.
    let config = ConfigService::new(None)?.get_config()?;
    let log_dir = HeadshotPaths::default().get_path(ServiceType::Logs).ok();
    let _log_guard = init_tracing(DEFAULT_FILTER, config.server.log_json, log_dir.as_deref());

    tracing::info!("Starting headshot-server {}", env!("CARGO_PKG_VERSION"));
    let ctx = AppContext::bootstrap(BootstrapOptions {
        config: Some(config),
        ..BootstrapOptions::default()
    })
    .await?;
    start_server(AppState::new(Arc::new(ctx))).await
}
