//! Glowhaus CLI - session migrations and commerce API checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! glowhaus-cli migrate storefront
//!
//! # Create the back-office session table
//! glowhaus-cli migrate admin
//!
//! # Create both
//! glowhaus-cli migrate all
//!
//! # Check the commerce API answers
//! glowhaus-cli api ping
//!
//! # Follow a mobile-money payment until it settles
//! GLOWHAUS_PASSWORD=... glowhaus-cli payment watch -e shopper@example.com PAY-123
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create session tables
//! - `api ping` - Check the commerce API
//! - `payment watch` - Poll a payment's status

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "glowhaus-cli")]
#[command(author, version, about = "Glowhaus CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Talk to the commerce API
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },
    /// Inspect payments
    Payment {
        #[command(subcommand)]
        action: PaymentAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table
    Storefront,
    /// Back-office session table
    Admin,
    /// Both session tables
    All,
}

#[derive(Subcommand)]
enum ApiAction {
    /// Check that the API answers without a server error
    Ping,
}

#[derive(Subcommand)]
enum PaymentAction {
    /// Poll a payment until it settles or the timeout elapses
    Watch {
        /// Payment reference returned when the payment was started
        reference: String,

        /// Email of the account that owns the payment
        #[arg(short, long)]
        email: String,

        /// Password for that account
        #[arg(long, env = "GLOWHAUS_PASSWORD", hide_env_values = true)]
        password: String,

        /// Seconds between status checks
        #[arg(long, default_value_t = 3)]
        interval: u64,

        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 90)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "glowhaus_cli=info,glowhaus_api=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Api { action } => match action {
            ApiAction::Ping => commands::api::ping().await?,
        },
        Commands::Payment { action } => match action {
            PaymentAction::Watch {
                reference,
                email,
                password,
                interval,
                timeout,
            } => {
                let policy = commands::payment::policy(interval, timeout)?;
                commands::payment::watch(&reference, &email, password.into(), policy).await?;
            }
        },
    }
    Ok(())
}
