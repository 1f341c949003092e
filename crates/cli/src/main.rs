//! Mycoflora CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply site and session migrations
//! myco-cli migrate
//!
//! # Create an account (password from --password or MYCO_USER_PASSWORD)
//! myco-cli user create -l mary -e mary@example.org
//!
//! # Grant or revoke the admin attribute
//! myco-cli user grant-admin mary
//! myco-cli user revoke-admin mary
//!
//! # Load names, licenses, projects and contest entries from YAML
//! myco-cli seed data/seed.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "myco-cli")]
#[command(author, version, about = "Mycoflora CLI tools")]
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
    /// Load reference data from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Login name
        #[arg(short, long)]
        login: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long, env = "MYCO_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Give the account the admin attribute
        #[arg(long)]
        admin: bool,
    },
    /// Give an existing account the admin attribute
    GrantAdmin {
        /// Login name
        login: String,
    },
    /// Remove the admin attribute from an account
    RevokeAdmin {
        /// Login name
        login: String,
    },
}

#[tokio::main]
async fn main() {
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
            UserAction::Create {
                login,
                email,
                password,
                admin,
            } => {
                commands::user::create(&login, &email, &password, admin).await?;
            }
            UserAction::GrantAdmin { login } => commands::user::set_admin(&login, true).await?,
            UserAction::RevokeAdmin { login } => commands::user::set_admin(&login, false).await?,
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
