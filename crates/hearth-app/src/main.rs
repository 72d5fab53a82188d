use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use hearth_app::app::api::routes;
use hearth_app::config::ConfigHandler;
use hearth_app::db_handler::DbProviderHandler;
use hearth_app::token_handler::TokenServiceHandler;
use hearth_core::config::load_config;
use hearth_core::constants::API_ROUTE_PREFIX;
use hearth_db::db::connection::create_pool;
use hearth_service::auth::token::TokenService;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Hearth family hub server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let token_service = TokenService::new(&config.auth);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(TokenServiceHandler {
            service: std::sync::Arc::new(token_service),
        })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}, API mounted at {API_ROUTE_PREFIX}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
