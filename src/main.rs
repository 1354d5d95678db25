use northwind_api::config::AppConfig;
use northwind_api::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Info by default, sqlx statement logging kept at warn; RUST_LOG overrides
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,sqlx=warn"))
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}, request_timeout={}s",
        config.server_address(),
        config.server.request_timeout_secs
    );

    run_server(config).await
}
