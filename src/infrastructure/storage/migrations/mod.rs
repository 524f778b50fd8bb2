//! Database migrations

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Applies a migration unless it is already recorded
    ///
    /// The schema change and its bookkeeping row commit together.
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to run migration {}: {}", migration.version, e))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to record migration {}: {}", migration.version, e))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        info!(version = migration.version, "Applied migration: {}", migration.description);
        Ok(true)
    }

    /// Latest applied version, if any
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// A versioned schema change
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub up: String,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
        }
    }
}

/// Schema for the accounts table
///
/// The unique constraint is what ultimately rejects a racing duplicate
/// username; the check constraint mirrors the active/audit invariant.
pub fn account_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create accounts table",
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                username VARCHAR(100) NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(50) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                active BOOLEAN NOT NULL,
                deactivated_at TIMESTAMPTZ,
                deactivation_reason VARCHAR(50),
                deactivated_by VARCHAR(50),
                last_login_at TIMESTAMPTZ,
                CONSTRAINT uk_accounts_username UNIQUE (username)
            );
            CREATE INDEX IF NOT EXISTS idx_accounts_created_at ON accounts(created_at);
            "#,
        ),
        Migration::new(
            2,
            "Enforce deactivation audit invariant",
            r#"
            ALTER TABLE accounts ADD CONSTRAINT ck_accounts_deactivation_audit CHECK (
                (active
                    AND deactivated_at IS NULL
                    AND deactivation_reason IS NULL
                    AND deactivated_by IS NULL)
                OR (NOT active
                    AND deactivated_at IS NOT NULL
                    AND deactivation_reason IS NOT NULL
                    AND deactivated_by IS NOT NULL)
            );
            "#,
        ),
    ]
}

/// Apply every pending account migration in version order
pub async fn run_account_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in account_migrations() {
        migrator.run_migration(&migration).await?;
    }

    Ok(())
}
