//! Domain layer - Core business logic and entities

pub mod account;
pub mod error;

pub use account::{Account, AccountId, AccountRepository, DeactivationReason, Role};
pub use error::DomainError;
