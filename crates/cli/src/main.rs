//! Delicious CLI - Database migrations and sample data.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! dtd-cli migrate
//!
//! # Load sample users, stores and reviews
//! dtd-cli seed crates/cli/data/sample.yaml
//!
//! # Remove all users, stores, reviews and hearts
//! dtd-cli wipe --yes
//! ```
//!
//! # Environment Variables
//!
//! - `DELICIOUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dtd-cli")]
#[command(author, version, about = "Dang That's Delicious CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load users, stores and reviews from a YAML file
    Seed {
        /// Path to the YAML file
        #[arg(default_value = "crates/cli/data/sample.yaml")]
        file: String,
    },
    /// Delete every user, store, review and heart
    Wipe {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Wipe { yes } => {
            if !yes {
                return Err("refusing to wipe without --yes".into());
            }
            commands::wipe::run().await?;
        }
    }
    Ok(())
}
