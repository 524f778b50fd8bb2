//! Account construction

use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{Account, Role};
use super::validation::validate_username;
use crate::domain::DomainError;

/// Builds new accounts from already-hashed credentials
pub trait AccountFactory: Send + Sync + Debug {
    fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<Account, DomainError>;
}

/// Factory applying the shared username rules and a non-blank hash check
#[derive(Debug, Clone, Default)]
pub struct DefaultAccountFactory;

impl DefaultAccountFactory {
    pub fn new() -> Self {
        Self
    }
}

impl AccountFactory for DefaultAccountFactory {
    fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<Account, DomainError> {
        validate_username(username).map_err(|v| DomainError::invalid_username(v.to_string()))?;

        if password_hash.trim().is_empty() {
            return Err(DomainError::invalid_argument("Password hash must not be blank"));
        }

        Ok(Account::new(username, password_hash, role, created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account() {
        let now = Utc::now();
        let account = DefaultAccountFactory::new()
            .create("factory_user1", "$argon2id$hash", Role::Admin, now)
            .unwrap();

        assert_eq!(account.username(), "factory_user1");
        assert_eq!(account.role(), Role::Admin);
        assert_eq!(account.created_at(), now);
        assert!(account.is_active());
    }

    #[test]
    fn test_rejects_invalid_username() {
        let result = DefaultAccountFactory::new().create("9lives", "hash", Role::User, Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidUsername { .. })));
    }

    #[test]
    fn test_rejects_blank_hash() {
        let result = DefaultAccountFactory::new().create("someone", "  ", Role::User, Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }
}
