//! Account repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{Account, AccountId};
use crate::domain::DomainError;

/// Storage for accounts
///
/// Implementations must enforce username uniqueness themselves and report a
/// conflicting insert as `AlreadyExists`; the service's existence pre-check
/// does not close the race between two concurrent creations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Insert an account without an id (assigning one) or update an existing one
    async fn save(&self, account: Account) -> Result<Account, DomainError>;

    /// Returns whether an account was removed
    async fn delete(&self, id: &AccountId) -> Result<bool, DomainError>;

    async fn find_all(&self) -> Result<Vec<Account>, DomainError>;
}
