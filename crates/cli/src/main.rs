//! Sugarcane CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sc-cli migrate
//!
//! # Create an admin account (password generated if omitted)
//! sc-cli account create-admin -u root_admin -f "Store Admin"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `account create-admin` - Bootstrap an admin account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "Sugarcane CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create an admin account
    CreateAdmin {
        /// Username for the admin account
        #[arg(short, long)]
        username: String,

        /// Display name for the admin account
        #[arg(short, long)]
        fullname: String,

        /// Password (generated and printed if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sc_cli=info,sqlx=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await.map_err(|e| e.to_string()),
        Commands::Account { action } => match action {
            AccountAction::CreateAdmin {
                username,
                fullname,
                password,
            } => commands::admin::create_admin(&username, &fullname, password.as_deref())
                .await
                .map_err(|e| e.to_string()),
        },
    };

    if let Err(message) = result {
        tracing::error!("{message}");
        std::process::exit(1);
    }
}
