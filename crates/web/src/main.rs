use std::net::SocketAddr;

use tracing::info;

use testtool_common::ToolConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = testtool_common::default_config_path();
    let mut config = ToolConfig::load(&config_path)?;

    // Environment overrides
    if let Ok(addr) = std::env::var("TESTTOOL_WEB_ADDR") {
        config.web.listen = addr;
    }
    let web_addr: SocketAddr = config.web.listen.parse()?;

    match std::env::var("TESTTOOL_BACKEND_URL") {
        Ok(url) if !url.trim().is_empty() => config.backend_url = url,
        // the console answers the module endpoints itself
        _ if config.web.mount_demo_backend => config.backend_url = format!("http://{}", web_addr),
        _ => {}
    }

    info!(
        "Starting testtool console on http://{} (config: {}, backend: {})",
        web_addr,
        config_path.display(),
        config.backend_url
    );

    testtool_web::server::serve(web_addr, &config).await
}
