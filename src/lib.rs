//! Account Lifecycle
//!
//! User account management with:
//! - Validated creation (username format, password strength, uniqueness)
//! - Password rotation gated on the current password
//! - Active/deactivated lifecycle with a mandatory deactivation audit trail
//! - In-memory and PostgreSQL storage, Argon2 password hashing

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
