use anyhow::Context;
use clap::Parser;
use music_library::{api, database, Args};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional, the environment may already be configured
    dotenvy::dotenv().ok();

    {
        use tracing_subscriber::prelude::*;

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init()
    }

    let args = Args::parse();

    let pool = database::connect_to_database(&args.database_url, args.max_connections)
        .await
        .context("failed to connect to the database")?;
    database::run_migrations(&pool)
        .await
        .context("failed to migrate the database")?;

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(addr = %args.listen, "music library listening");

    axum::serve(listener, api::router(pool.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            // without a signal handler the server runs until killed
            error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await
        }
    }
}
