//! Latchkey CLI - Database migrations and user registration.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! latchkey migrate
//!
//! # Register a user
//! latchkey user create -e first@gmail.com -p password
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Register a user with email and password

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "latchkey")]
#[command(author, version, about = "Latchkey CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user
    Create {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// User password (8 to 128 characters)
        #[arg(short, long, env = "LATCHKEY_USER_PASSWORD", hide_env_values = true)]
        password: String,
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
            UserAction::Create { email, password } => {
                commands::user::create(&email, &password).await?;
            }
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
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "latchkey",
            "user",
            "create",
            "-e",
            "first@gmail.com",
            "-p",
            "password",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let Commands::User {
            action: UserAction::Create { email, password },
        } = cli.command
        else {
            panic!("expected user create");
        };
        assert_eq!(email, "first@gmail.com");
        assert_eq!(password, "password");
    }
}
