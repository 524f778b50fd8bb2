//! Account infrastructure
//!
//! Argon2 password hashing, in-memory and PostgreSQL account storage, and
//! the account lifecycle service.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresAccountRepository;
pub use repository::InMemoryAccountRepository;
pub use service::{
    AccountService, CreateAccountRequest, DeactivateAccountRequest, RotatePasswordRequest,
};
