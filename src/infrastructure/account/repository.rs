//! In-memory account repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::{Account, AccountId, AccountRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    /// username -> id
    usernames: HashMap<String, AccountId>,
}

/// In-memory implementation of AccountRepository
///
/// Both maps sit behind one lock so the uniqueness check and the insert are
/// atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let tables = self.tables.read().await;

        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.usernames.contains_key(username))
    }

    async fn save(&self, mut account: Account) -> Result<Account, DomainError> {
        let mut tables = self.tables.write().await;

        match account.id().copied() {
            None => {
                if tables.usernames.contains_key(account.username()) {
                    return Err(DomainError::already_exists(format!(
                        "Username '{}' is already taken",
                        account.username()
                    )));
                }

                let id = AccountId::generate();
                account.assign_id(id);

                tables.usernames.insert(account.username().to_string(), id);
                tables.accounts.insert(id, account.clone());
            }
            Some(id) => {
                let Some(existing) = tables.accounts.get(&id) else {
                    return Err(DomainError::not_found(format!("Account '{}' not found", id)));
                };

                if existing.username() != account.username() {
                    return Err(DomainError::invalid_argument(format!(
                        "Username of account '{}' cannot change",
                        id
                    )));
                }

                tables.accounts.insert(id, account.clone());
            }
        }

        Ok(account)
    }

    async fn delete(&self, id: &AccountId) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;

        match tables.accounts.remove(id) {
            Some(account) => {
                tables.usernames.remove(account.username());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_all(&self) -> Result<Vec<Account>, DomainError> {
        let tables = self.tables.read().await;

        let mut accounts: Vec<Account> = tables.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.username().cmp(b.username()))
        });

        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Role;
    use chrono::Utc;

    fn new_account(username: &str) -> Account {
        Account::new(username, "hashed_password", Role::User, Utc::now())
    }

    #[tokio::test]
    async fn test_save_assigns_id() {
        let repo = InMemoryAccountRepository::new();

        let saved = repo.save(new_account("testuser")).await.unwrap();
        let id = *saved.id().unwrap();

        let retrieved = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(retrieved, saved);
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let repo = InMemoryAccountRepository::new();
        let saved = repo.save(new_account("testuser")).await.unwrap();

        let retrieved = repo.find_by_username("testuser").await.unwrap().unwrap();
        assert_eq!(retrieved.id(), saved.id());

        assert!(repo.find_by_username("TestUser").await.unwrap().is_none());
        assert!(repo.exists_by_username("testuser").await.unwrap());
        assert!(!repo.exists_by_username("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_username_uniqueness_on_insert() {
        let repo = InMemoryAccountRepository::new();
        repo.save(new_account("testuser")).await.unwrap();

        let result = repo.save(new_account("testuser")).await;
        assert!(matches!(result, Err(DomainError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_update_existing() {
        let repo = InMemoryAccountRepository::new();
        let mut account = repo.save(new_account("testuser")).await.unwrap();

        account.set_password_hash("rotated");
        repo.save(account.clone()).await.unwrap();

        let retrieved = repo.find_by_id(account.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(retrieved.password_hash(), "rotated");
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let repo = InMemoryAccountRepository::new();
        let mut account = new_account("ghost");
        account.assign_id(AccountId::generate());

        let result = repo.save(account).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_frees_username() {
        let repo = InMemoryAccountRepository::new();
        let saved = repo.save(new_account("testuser")).await.unwrap();

        assert!(repo.delete(saved.id().unwrap()).await.unwrap());
        assert!(!repo.delete(saved.id().unwrap()).await.unwrap());
        assert!(!repo.exists_by_username("testuser").await.unwrap());

        repo.save(new_account("testuser")).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_all() {
        let repo = InMemoryAccountRepository::new();

        repo.save(new_account("user1")).await.unwrap();
        repo.save(new_account("user2")).await.unwrap();

        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }
}
