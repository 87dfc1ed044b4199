use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pocketbook::db::{ConnectionProvider, init_schema};
use pocketbook::middleware::JwtKeys;
use pocketbook::router::{AppState, app_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = pocketbook::AppConfig::from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.server.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database = %cfg.database.address(),
        database_name = %cfg.database.database,
        user = %cfg.database.user,
        listen_addr = %cfg.server.listen_addr,
        loglevel = %cfg.server.loglevel,
        token_ttl_hours = cfg.server.token_ttl_hours,
    );

    if cfg.server.jwt_secret_key.is_empty() {
        return Err("JWT_SECRET_KEY must be set".into());
    }

    let provider = ConnectionProvider::new(cfg.database.clone());

    if cfg.server.init_schema {
        match provider.connect().await {
            Ok(mut conn) => {
                init_schema(&mut conn).await?;
                info!("database schema initialized");
            }
            Err(_) => warn!("skipping schema initialization; database unreachable"),
        }
    }

    let jwt = JwtKeys::new(
        cfg.server.jwt_secret_key.as_bytes(),
        chrono::Duration::hours(cfg.server.token_ttl_hours),
    );
    let app = app_router(AppState::new(provider, jwt));

    let listener = TcpListener::bind(cfg.server.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.server.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
