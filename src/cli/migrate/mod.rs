//! Migrate command - applies pending schema migrations

use sqlx::PgPool;
use tracing::info;

use crate::infrastructure::storage::{account_migrations, PostgresMigrator};

/// Apply every pending account migration and report the resulting version
pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in account_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    let version = migrator.current_version().await?;
    info!(applied, ?version, "Migrations complete");
    println!("{}", serde_json::json!({ "applied": applied, "version": version }));

    Ok(())
}

/// The in-memory backend has no schema
pub fn skip() -> anyhow::Result<()> {
    info!("In-memory storage has no schema; nothing to migrate");
    Ok(())
}
