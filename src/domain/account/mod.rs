//! Account domain
//!
//! Entity, lifecycle invariant, credential rules and the storage trait for
//! user accounts.

mod entity;
mod factory;
mod repository;
mod validation;

pub use entity::{
    Account, AccountId, AccountRecord, DeactivationAudit, DeactivationReason, Role,
};
pub use factory::{AccountFactory, DefaultAccountFactory};
pub use repository::AccountRepository;
pub use validation::{
    validate_password, validate_username, AccountValidationError, Violations,
    MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
    PASSWORD_SPECIAL_CHARACTERS,
};

#[cfg(test)]
pub use repository::MockAccountRepository;
