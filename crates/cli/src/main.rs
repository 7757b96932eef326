//! Shopforge CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! shopforge-cli migrate
//!
//! # Create a user account
//! shopforge-cli user create -e owner@example.com -n "Jana Nováková"
//!
//! # Create a platform operator
//! shopforge-cli user create -e ops@example.com -n "Ops" -r super_admin
//!
//! # Grant super_admin to an existing account
//! shopforge-cli user promote -e owner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFORGE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopforge-cli")]
#[command(author, version, about = "Shopforge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`user` or `super_admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    /// Grant `super_admin` to an existing account
    Promote {
        /// Email address
        #[arg(short, long)]
        email: String,
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
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(&email, &name, &role).await?;
            }
            UserAction::Promote { email } => commands::user::promote(&email).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_user_create_defaults_to_user_role() {
        let cli = Cli::parse_from(["shopforge-cli", "user", "create", "-e", "a@b.sk", "-n", "A"]);
        match cli.command {
            Commands::User {
                action: UserAction::Create { role, .. },
            } => assert_eq!(role, "user"),
            _ => panic!("expected user create"),
        }
    }
}
