//! CLI argument parsing for the rota-ml binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rota-ml", about = "Delivery routes and expenses API", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve {
        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create tables/collections and date indexes, then exit
    InitDb {
        /// Connection string (overrides DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
        /// Database name (overrides DATABASE_NAME)
        #[arg(long)]
        database_name: Option<String>,
    },
    /// Print the resolved configuration and exit
    CheckConfig,
}
