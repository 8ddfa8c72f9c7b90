use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use catalog_api::{
    app::{self, AppState},
    auth::verifier_from_config,
    config::config,
    database::{connect, run_migrations, PgCatalog},
    server::{serve_until, shutdown_signal},
};

#[derive(Parser)]
#[command(name = "catalog-api")]
#[command(about = "Product catalog and review API")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Listen port (overrides SERVER_PORT)")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting catalog API in {} mode", config.environment.as_str());

    let pool = connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            run_migrations(&pool).await.context("failed to run migrations")?;
            tracing::info!("Migrations applied");
            pool.close().await;
            return Ok(());
        }
        Commands::Serve => {}
    }

    if config.database.run_migrations {
        run_migrations(&pool).await.context("failed to run migrations")?;
    }

    let verifier = verifier_from_config(&config.auth).context("failed to initialize token verifier")?;
    let state = AppState::new(Arc::new(PgCatalog::new(pool.clone())), verifier);

    let mut server = config.server.clone();
    if let Some(port) = cli.port {
        server.port = port;
    }

    let bind_addr = server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Catalog API listening on http://{}", bind_addr);

    let result = serve_until(
        listener,
        app::service(state, &config.cors),
        shutdown_signal(),
        server.shutdown_grace(),
    )
    .await;

    pool.close().await;
    result.context("server terminated abnormally")
}
