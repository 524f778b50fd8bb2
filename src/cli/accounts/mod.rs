//! Account commands

use anyhow::bail;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use super::Command;
use crate::domain::account::{AccountId, AccountRepository, DeactivationReason, Role};
use crate::domain::DomainError;
use crate::infrastructure::account::{
    AccountService, CreateAccountRequest, DeactivateAccountRequest, PasswordHasher,
    RotatePasswordRequest,
};

#[derive(Args)]
pub struct CreateArgs {
    /// Username (3-20 characters; letters, digits and underscores)
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,

    /// ADMIN or USER
    #[arg(long)]
    pub role: Role,
}

#[derive(Args)]
pub struct RotatePasswordArgs {
    #[arg(long)]
    pub id: AccountId,

    #[arg(long)]
    pub current_password: String,

    #[arg(long)]
    pub new_password: String,
}

#[derive(Args)]
pub struct DeactivateArgs {
    #[arg(long)]
    pub id: AccountId,

    /// e.g. USER_REQUEST, ADMIN_ACTION, SECURITY_BREACH
    #[arg(long)]
    pub reason: DeactivationReason,

    /// Role of the actor performing the deactivation
    #[arg(long)]
    pub by: Role,

    /// RFC 3339 timestamp; defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct IdArgs {
    #[arg(long)]
    pub id: AccountId,
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(long, conflicts_with = "username", required_unless_present = "username")]
    pub id: Option<AccountId>,

    #[arg(long)]
    pub username: Option<String>,
}

/// Run one account command and print its result
pub async fn execute<R, H>(service: &AccountService<R, H>, command: Command) -> anyhow::Result<()>
where
    R: AccountRepository,
    H: PasswordHasher,
{
    match command {
        Command::Create(args) => {
            let request = CreateAccountRequest {
                username: args.username,
                password: args.password,
                role: Some(args.role),
            };
            print_json(&service.create(request, Utc::now()).await?)
        }
        Command::RotatePassword(args) => {
            let request = RotatePasswordRequest {
                current_password: args.current_password,
                new_password: args.new_password,
            };
            print_json(&service.rotate_password(&args.id, request).await?)
        }
        Command::Deactivate(args) => {
            let request = DeactivateAccountRequest::new(
                args.at.unwrap_or_else(Utc::now),
                args.reason,
                args.by,
            );
            print_json(&service.deactivate(&args.id, request).await?)
        }
        Command::Activate(args) => print_json(&service.activate(&args.id).await?),
        Command::Show(args) => {
            let account = match (args.id, args.username) {
                (Some(id), _) => service.get(&id).await?,
                (None, Some(username)) => service.get_by_username(&username).await?,
                (None, None) => bail!("either --id or --username is required"),
            };

            match account {
                Some(account) => print_json(&account),
                None => Err(DomainError::not_found("No matching account").into()),
            }
        }
        Command::List => print_json(&service.list().await?),
        Command::Delete(args) => {
            if !service.delete(&args.id).await? {
                return Err(DomainError::not_found(format!("Account '{}' not found", args.id)).into());
            }
            print_json(&serde_json::json!({ "deleted": args.id }))
        }
        Command::Migrate => bail!("migrate is handled before account commands"),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
