use std::net::SocketAddr;

use clap::Parser;

pub mod api;
pub mod database;
pub mod error;
pub mod record;

/// Command line options. Each one falls back to an environment variable, which may come from `.env`.
#[derive(Debug, Clone, Parser)]
#[command(name = "music-library", version, about = "JSON HTTP API for a music library")]
pub struct Args {
    /// sqlx connection string; a missing SQLite file is created
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://music_library.db")]
    pub database_url: String,

    /// Address the HTTP listener binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}
