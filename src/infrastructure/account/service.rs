//! Account lifecycle service
//!
//! Validates untrusted input, checks username uniqueness and drives the
//! account lifecycle, delegating persistence and hashing to collaborators.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::account::{
    validate_password, validate_username, Account, AccountFactory, AccountId, AccountRepository,
    DeactivationAudit, DeactivationReason, DefaultAccountFactory, Role,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Fractional-second digits kept on stored timestamps; PostgreSQL
/// `TIMESTAMPTZ` holds microseconds
pub const TIMESTAMP_PRECISION: u16 = 6;

/// Request for creating a new account
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Request for rotating an account's password
#[derive(Debug, Clone, Deserialize)]
pub struct RotatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request for deactivating an account; every field is required
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeactivateAccountRequest {
    pub occurred_at: Option<DateTime<Utc>>,
    pub reason: Option<DeactivationReason>,
    pub deactivated_by: Option<Role>,
}

impl DeactivateAccountRequest {
    pub fn new(occurred_at: DateTime<Utc>, reason: DeactivationReason, deactivated_by: Role) -> Self {
        Self {
            occurred_at: Some(occurred_at),
            reason: Some(reason),
            deactivated_by: Some(deactivated_by),
        }
    }
}

/// Account lifecycle and validation service
#[derive(Debug)]
pub struct AccountService<R: AccountRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    factory: Arc<dyn AccountFactory>,
}

impl<R: AccountRepository, H: PasswordHasher> AccountService<R, H> {
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self::with_factory(repository, hasher, Arc::new(DefaultAccountFactory::new()))
    }

    pub fn with_factory(
        repository: Arc<R>,
        hasher: Arc<H>,
        factory: Arc<dyn AccountFactory>,
    ) -> Self {
        Self {
            repository,
            hasher,
            factory,
        }
    }

    /// Create a new, active account
    ///
    /// Username rules and uniqueness are checked before the password, so a
    /// taken username is reported even when the password is also weak.
    /// `now` is truncated to [`TIMESTAMP_PRECISION`].
    pub async fn create(
        &self,
        request: CreateAccountRequest,
        now: DateTime<Utc>,
    ) -> Result<Account, DomainError> {
        let username = request.username.trim();
        validate_username(username).map_err(|v| DomainError::invalid_username(v.to_string()))?;

        if self.repository.exists_by_username(username).await? {
            warn!(username, "Rejected account creation: username taken");
            return Err(DomainError::already_exists(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        validate_password(&request.password)
            .map_err(|v| DomainError::invalid_password(v.to_string()))?;

        let role = request
            .role
            .ok_or_else(|| DomainError::invalid_argument("Role is required"))?;

        let password_hash = self.hasher.hash(&request.password)?;
        let created_at = now.trunc_subsecs(TIMESTAMP_PRECISION);
        let account = self.factory.create(username, &password_hash, role, created_at)?;
        self.check_invariant(&account)?;

        let account = self.repository.save(account).await?;
        info!(account_id = ?account.id(), username, role = %role, "Account created");

        Ok(account)
    }

    /// Replace the password after verifying the current one
    ///
    /// Nothing is written unless both the verification and the new
    /// password's rules pass.
    pub async fn rotate_password(
        &self,
        id: &AccountId,
        request: RotatePasswordRequest,
    ) -> Result<Account, DomainError> {
        let mut account = self.load(id).await?;

        if !self
            .hasher
            .verify(&request.current_password, account.password_hash())
        {
            warn!(account_id = %id, "Password rotation rejected: current password mismatch");
            return Err(DomainError::invalid_password("Current password is incorrect"));
        }

        validate_password(&request.new_password)
            .map_err(|v| DomainError::invalid_password(v.to_string()))?;

        let new_hash = self.hasher.hash(&request.new_password)?;
        account.set_password_hash(new_hash);
        self.check_invariant(&account)?;

        let account = self.repository.save(account).await?;
        info!(account_id = %id, "Password rotated");

        Ok(account)
    }

    /// Deactivate an account
    ///
    /// An already inactive account fails with `InvalidState` before the
    /// request's audit fields are looked at. The deactivation time is
    /// truncated to [`TIMESTAMP_PRECISION`].
    pub async fn deactivate(
        &self,
        id: &AccountId,
        request: DeactivateAccountRequest,
    ) -> Result<Account, DomainError> {
        let mut account = self.load(id).await?;

        account.ensure_active()?;
        let occurred_at = request
            .occurred_at
            .map(|at| at.trunc_subsecs(TIMESTAMP_PRECISION));
        let audit =
            DeactivationAudit::from_parts(occurred_at, request.reason, request.deactivated_by)?;

        account.deactivate(audit)?;
        self.check_invariant(&account)?;

        let account = self.repository.save(account).await?;
        info!(
            account_id = %id,
            reason = %audit.reason,
            deactivated_by = %audit.deactivated_by,
            "Account deactivated"
        );

        Ok(account)
    }

    /// Reactivate an account; already active accounts are returned unchanged
    pub async fn activate(&self, id: &AccountId) -> Result<Account, DomainError> {
        let mut account = self.load(id).await?;

        account.activate();
        self.check_invariant(&account)?;

        let account = self.repository.save(account).await?;
        info!(account_id = %id, "Account activated");

        Ok(account)
    }

    pub async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        self.repository.find_by_id(id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        self.repository.find_by_username(username.trim()).await
    }

    pub async fn list(&self) -> Result<Vec<Account>, DomainError> {
        self.repository.find_all().await
    }

    pub async fn delete(&self, id: &AccountId) -> Result<bool, DomainError> {
        let deleted = self.repository.delete(id).await?;

        if deleted {
            info!(account_id = %id, "Account deleted");
        }

        Ok(deleted)
    }

    async fn load(&self, id: &AccountId) -> Result<Account, DomainError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", id)))
    }

    fn check_invariant(&self, account: &Account) -> Result<(), DomainError> {
        account.validate_state().inspect_err(|e| {
            error!(username = account.username(), error = %e, "Account invariant violated");
        })
    }
}
