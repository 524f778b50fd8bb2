//! Storage infrastructure - PostgreSQL pooling and schema migrations

pub mod migrations;
mod postgres;

pub use migrations::{account_migrations, run_account_migrations, Migration, PostgresMigrator};
pub use postgres::{connect, PostgresConfig};
