use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid username: {message}")]
    InvalidUsername { message: String },

    /// Covers both format failures and credential mismatches; the call site
    /// tells them apart.
    #[error("Invalid password: {message}")]
    InvalidPassword { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Already exists: {message}")]
    AlreadyExists { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_username(message: impl Into<String>) -> Self {
        Self::InvalidUsername {
            message: message.into(),
        }
    }

    pub fn invalid_password(message: impl Into<String>) -> Self {
        Self::InvalidPassword {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// An `InvalidState` error means an account broke its own lifecycle
    /// invariant or was driven through an illegal transition.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Account 'abc' not found");
        assert_eq!(error.to_string(), "Not found: Account 'abc' not found");
    }

    #[test]
    fn test_already_exists_error() {
        let error = DomainError::already_exists("Username 'bob' is already taken");
        assert_eq!(
            error.to_string(),
            "Already exists: Username 'bob' is already taken"
        );
    }

    #[test]
    fn test_invariant_violation() {
        assert!(DomainError::invalid_state("broken").is_invariant_violation());
        assert!(!DomainError::invalid_argument("missing").is_invariant_violation());
    }
}
