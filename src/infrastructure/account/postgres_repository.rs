//! PostgreSQL account repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::account::{Account, AccountId, AccountRecord, AccountRepository};
use crate::domain::DomainError;

const SELECT_COLUMNS: &str = r#"
    SELECT id, username, password_hash, role, created_at, active,
           deactivated_at, deactivation_reason, deactivated_by, last_login_at
    FROM accounts
"#;

/// PostgreSQL implementation of AccountRepository
///
/// Username uniqueness is enforced by the `uk_accounts_username` constraint.
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, mut account: Account) -> Result<Account, DomainError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (username, password_hash, role, created_at, active,
                                  deactivated_at, deactivation_reason, deactivated_by,
                                  last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(account.username())
        .bind(account.password_hash())
        .bind(account.role().as_str())
        .bind(account.created_at())
        .bind(account.is_active())
        .bind(account.deactivated_at())
        .bind(account.deactivation_reason().map(|r| r.as_str()))
        .bind(account.deactivated_by().map(|r| r.as_str()))
        .bind(account.last_login_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::already_exists(format!(
                    "Username '{}' is already taken",
                    account.username()
                ))
            } else {
                DomainError::storage(format!("Failed to create account: {}", e))
            }
        })?;

        account.assign_id(AccountId::new(id));
        Ok(account)
    }

    async fn update(&self, id: AccountId, account: Account) -> Result<Account, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, role = $3, active = $4, deactivated_at = $5,
                deactivation_reason = $6, deactivated_by = $7, last_login_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(account.password_hash())
        .bind(account.role().as_str())
        .bind(account.is_active())
        .bind(account.deactivated_at())
        .bind(account.deactivation_reason().map(|r| r.as_str()))
        .bind(account.deactivated_by().map(|r| r.as_str()))
        .bind(account.last_login_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update account: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Account '{}' not found", id)));
        }

        Ok(account)
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE username = $1", SELECT_COLUMNS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account by username: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check username: {}", e)))
    }

    async fn save(&self, account: Account) -> Result<Account, DomainError> {
        match account.id().copied() {
            None => self.insert(account).await,
            Some(id) => self.update(id, account).await,
        }
    }

    async fn delete(&self, id: &AccountId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete account: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_all(&self) -> Result<Vec<Account>, DomainError> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at, username", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list accounts: {}", e)))?;

        rows.iter().map(row_to_account).collect()
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", name, e)))
}

/// Raw column values of one `accounts` row
#[derive(Debug)]
struct AccountRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    active: bool,
    deactivated_at: Option<DateTime<Utc>>,
    deactivation_reason: Option<String>,
    deactivated_by: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn read(row: &PgRow) -> Result<Self, DomainError> {
        Ok(Self {
            id: column(row, "id")?,
            username: column(row, "username")?,
            password_hash: column(row, "password_hash")?,
            role: column(row, "role")?,
            created_at: column(row, "created_at")?,
            active: column(row, "active")?,
            deactivated_at: column(row, "deactivated_at")?,
            deactivation_reason: column(row, "deactivation_reason")?,
            deactivated_by: column(row, "deactivated_by")?,
            last_login_at: column(row, "last_login_at")?,
        })
    }

    /// Rows that break the lifecycle invariant are rejected by `Account::restore`
    fn into_account(self) -> Result<Account, DomainError> {
        Account::restore(AccountRecord {
            id: AccountId::new(self.id),
            username: self.username,
            password_hash: self.password_hash,
            role: self.role.parse()?,
            created_at: self.created_at,
            active: self.active,
            deactivated_at: self.deactivated_at,
            deactivation_reason: self.deactivation_reason.as_deref().map(str::parse).transpose()?,
            deactivated_by: self.deactivated_by.as_deref().map(str::parse).transpose()?,
            last_login_at: self.last_login_at,
        })
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, DomainError> {
    AccountRow::read(row)?.into_account()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{DeactivationReason, Role};
    use chrono::TimeZone;

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn active_row() -> AccountRow {
        AccountRow {
            id: Uuid::new_v4(),
            username: "newuser".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            role: "USER".to_string(),
            created_at: created_at(),
            active: true,
            deactivated_at: None,
            deactivation_reason: None,
            deactivated_by: None,
            last_login_at: None,
        }
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
        assert!(!is_unique_violation(&sqlx::Error::Protocol(
            "duplicate key".to_string()
        )));
    }

    #[test]
    fn test_active_row_conversion() {
        let row = active_row();
        let id = row.id;

        let account = row.into_account().unwrap();

        assert_eq!(account.id(), Some(&AccountId::new(id)));
        assert_eq!(account.username(), "newuser");
        assert_eq!(account.role(), Role::User);
        assert_eq!(account.created_at(), created_at());
        assert!(account.is_active());
        assert!(account.deactivation().is_none());
    }

    #[test]
    fn test_deactivated_row_conversion() {
        let at = created_at() + chrono::Duration::days(1);
        let row = AccountRow {
            active: false,
            deactivated_at: Some(at),
            deactivation_reason: Some("SECURITY_BREACH".to_string()),
            deactivated_by: Some("ADMIN".to_string()),
            ..active_row()
        };

        let account = row.into_account().unwrap();

        assert!(!account.is_active());
        assert_eq!(account.deactivated_at(), Some(at));
        assert_eq!(
            account.deactivation_reason(),
            Some(DeactivationReason::SecurityBreach)
        );
        assert_eq!(account.deactivated_by(), Some(Role::Admin));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let row = AccountRow {
            role: "SUPERUSER".to_string(),
            ..active_row()
        };

        assert!(matches!(
            row.into_account(),
            Err(DomainError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_partial_audit_row_is_rejected() {
        let row = AccountRow {
            active: false,
            deactivated_at: Some(created_at()),
            deactivation_reason: None,
            deactivated_by: Some("ADMIN".to_string()),
            ..active_row()
        };

        let err = row.into_account().unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_active_row_with_audit_is_rejected() {
        let row = AccountRow {
            deactivation_reason: Some("USER_REQUEST".to_string()),
            ..active_row()
        };

        assert!(matches!(
            row.into_account(),
            Err(DomainError::InvalidState { .. })
        ));
    }
}
