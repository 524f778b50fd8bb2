//! Username and password rules
//!
//! Every rule is evaluated independently; all failures for one field are
//! collected into a single [`Violations`] report instead of stopping at the
//! first broken rule.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 20;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 32;

/// Characters accepted as the "special" class of a password
pub const PASSWORD_SPECIAL_CHARACTERS: &str = r#"!@#$%^&*()_+[]{}|;:'",.<>?/"#;

static USERNAME_FIRST_IS_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]").unwrap());
static USERNAME_LAST_IS_LETTER_OR_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9]$").unwrap());
static USERNAME_ALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());

static PASSWORD_HAS_LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").unwrap());
static PASSWORD_HAS_UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").unwrap());
static PASSWORD_HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());
static PASSWORD_HAS_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*()_+\[\]{}|;:'",.<>?/]"#).unwrap());

/// A single broken username or password rule
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccountValidationError {
    #[error("Username must be {}-{} characters long", MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH)]
    UsernameLength,

    #[error("Username must start with a letter")]
    UsernameStart,

    #[error("Username must end with a letter or digit")]
    UsernameEnd,

    #[error("Username must contain only letters, digits and underscores")]
    UsernameCharacters,

    #[error("Password must be {}-{} characters long", MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)]
    PasswordLength,

    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,

    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    #[error("Password must contain at least one digit")]
    PasswordMissingDigit,

    #[error("Password must contain at least one special character ({})", PASSWORD_SPECIAL_CHARACTERS)]
    PasswordMissingSpecial,
}

/// Every rule a single input failed, in rule order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations(Vec<AccountValidationError>);

impl Violations {
    fn check(&mut self, passed: bool, error: AccountValidationError) {
        if !passed {
            self.0.push(error);
        }
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn errors(&self) -> &[AccountValidationError] {
        &self.0
    }

    pub fn contains(&self, error: AccountValidationError) -> bool {
        self.0.contains(&error)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rule(s) violated:", self.0.len())?;

        for error in &self.0 {
            write!(f, "\n- {}", error)?;
        }

        Ok(())
    }
}

/// Validate an already-trimmed username
///
/// Rules:
/// - 3 to 20 characters
/// - First character is a letter
/// - Last character is a letter or digit
/// - Only letters, digits and underscores
pub fn validate_username(username: &str) -> Result<(), Violations> {
    let length = username.chars().count();
    let mut violations = Violations::default();

    violations.check(
        (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length),
        AccountValidationError::UsernameLength,
    );
    violations.check(
        USERNAME_FIRST_IS_LETTER.is_match(username),
        AccountValidationError::UsernameStart,
    );
    violations.check(
        USERNAME_LAST_IS_LETTER_OR_DIGIT.is_match(username),
        AccountValidationError::UsernameEnd,
    );
    violations.check(
        USERNAME_ALLOWED_CHARS.is_match(username),
        AccountValidationError::UsernameCharacters,
    );

    violations.into_result()
}

/// Validate a raw (not yet hashed) password
///
/// Rules:
/// - 8 to 32 characters
/// - At least one lowercase letter, one uppercase letter, one digit and one
///   character from [`PASSWORD_SPECIAL_CHARACTERS`]
pub fn validate_password(password: &str) -> Result<(), Violations> {
    let length = password.chars().count();
    let mut violations = Violations::default();

    violations.check(
        (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length),
        AccountValidationError::PasswordLength,
    );
    violations.check(
        PASSWORD_HAS_LOWERCASE.is_match(password),
        AccountValidationError::PasswordMissingLowercase,
    );
    violations.check(
        PASSWORD_HAS_UPPERCASE.is_match(password),
        AccountValidationError::PasswordMissingUppercase,
    );
    violations.check(
        PASSWORD_HAS_DIGIT.is_match(password),
        AccountValidationError::PasswordMissingDigit,
    );
    violations.check(
        PASSWORD_HAS_SPECIAL.is_match(password),
        AccountValidationError::PasswordMissingSpecial,
    );

    violations.into_result()
}
