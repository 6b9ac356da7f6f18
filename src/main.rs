use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tenant_iam::auth::SigningKeys;
use tenant_iam::config::AppConfig;
use tenant_iam::database::{DatabaseManager, PgIdentityStore};
use tenant_iam::AppContext;

#[derive(Parser)]
#[command(name = "tenant-iam")]
#[command(about = "Delegation token and authorization service")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Port to listen on (overrides API_PORT/PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Apply database migrations before serving")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TOKEN_* etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    tracing::info!("Starting tenant-iam in {:?} mode", config.environment);

    let keys = SigningKeys::from_config(&config.tokens).context("failed to load signing keys")?;

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the identity store")?;
    if cli.migrate {
        DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    }

    let port = config.api.port;
    let ctx = AppContext::new(config, keys, Arc::new(PgIdentityStore::new(pool)))?;
    let app = tenant_iam::router(ctx);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("tenant-iam listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
