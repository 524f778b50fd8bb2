//! CLI module for account lifecycle management
//!
//! Each subcommand runs one account operation against the configured
//! storage backend and prints the result as JSON.

pub mod accounts;
pub mod migrate;

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use crate::config::{AppConfig, StorageBackend};
use crate::domain::DomainError;
use crate::infrastructure::account::{
    AccountService, Argon2Hasher, InMemoryAccountRepository, PostgresAccountRepository,
};
use crate::infrastructure::logging;
use crate::infrastructure::storage::{self, PostgresConfig};

/// Account lifecycle - create, rotate, deactivate and reactivate user accounts
#[derive(Parser)]
#[command(name = "account-lifecycle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new active account
    Create(accounts::CreateArgs),

    /// Replace an account's password after verifying the current one
    RotatePassword(accounts::RotatePasswordArgs),

    /// Deactivate an account, recording when, why and by whom
    Deactivate(accounts::DeactivateArgs),

    /// Reactivate a deactivated account
    Activate(accounts::IdArgs),

    /// Show a single account by id or username
    Show(accounts::ShowArgs),

    /// List all accounts
    List,

    /// Delete an account
    Delete(accounts::IdArgs),

    /// Apply pending database migrations
    Migrate,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::RotatePassword(_) => "rotate-password",
            Command::Deactivate(_) => "deactivate",
            Command::Activate(_) => "activate",
            Command::Show(_) => "show",
            Command::List => "list",
            Command::Delete(_) => "delete",
            Command::Migrate => "migrate",
        }
    }

    /// Whether the command reads accounts written by an earlier run
    fn needs_persistent_storage(&self) -> bool {
        !matches!(self, Command::Create(_) | Command::Migrate)
    }
}

/// The in-memory store starts empty on every run, so only commands that
/// don't look up existing accounts may use it
fn check_backend(command: &Command, backend: StorageBackend) -> anyhow::Result<()> {
    if backend == StorageBackend::Memory && command.needs_persistent_storage() {
        bail!(
            "`{}` needs persistent storage, but storage.backend is \"memory\"; \
             set storage.backend = \"postgres\" and storage.url \
             (or APP__STORAGE__BACKEND / APP__STORAGE__URL)",
            command.name()
        );
    }

    Ok(())
}

/// Load configuration, set up logging and storage, then run the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging)?;

    check_backend(&cli.command, config.storage.backend)?;

    let hasher = Arc::new(Argon2Hasher::new());

    let result = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; the created account is discarded on exit");

            if matches!(cli.command, Command::Migrate) {
                return migrate::skip();
            }

            let service = AccountService::new(Arc::new(InMemoryAccountRepository::new()), hasher);
            accounts::execute(&service, cli.command).await
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .url
                .clone()
                .context("storage.url is required for the postgres backend")?;
            let pool = storage::connect(
                &PostgresConfig::new(url).with_max_connections(config.storage.max_connections),
            )
            .await?;

            if matches!(cli.command, Command::Migrate) {
                return migrate::run(&pool).await;
            }

            storage::run_account_migrations(&pool).await?;

            let service = AccountService::new(Arc::new(PostgresAccountRepository::new(pool)), hasher);
            accounts::execute(&service, cli.command).await
        }
    };

    result.inspect_err(report_defect)
}

/// Invariant violations are programming defects, not user mistakes
fn is_defect(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DomainError>()
        .is_some_and(DomainError::is_invariant_violation)
}

fn report_defect(err: &anyhow::Error) {
    if is_defect(err) {
        error!(error = %err, "Defect: account lifecycle invariant violated");
    }
}
