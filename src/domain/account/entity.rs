//! Account entity and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Account identifier, assigned by storage on first save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::invalid_argument(format!("Invalid account ID '{}': {}", s, e)))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Whether this role may manage other accounts
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            _ => Err(DomainError::invalid_argument(format!("Unknown role '{}'", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an account was deactivated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeactivationReason {
    UserRequest,
    AdminAction,
    SecurityBreach,
    Inactivity,
    TermsViolation,
    FraudDetection,
    SystemError,
}

impl DeactivationReason {
    pub const ALL: [DeactivationReason; 7] = [
        Self::UserRequest,
        Self::AdminAction,
        Self::SecurityBreach,
        Self::Inactivity,
        Self::TermsViolation,
        Self::FraudDetection,
        Self::SystemError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRequest => "USER_REQUEST",
            Self::AdminAction => "ADMIN_ACTION",
            Self::SecurityBreach => "SECURITY_BREACH",
            Self::Inactivity => "INACTIVITY",
            Self::TermsViolation => "TERMS_VIOLATION",
            Self::FraudDetection => "FRAUD_DETECTION",
            Self::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl FromStr for DeactivationReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_uppercase().replace('-', "_");

        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str() == normalized)
            .ok_or_else(|| DomainError::invalid_argument(format!("Unknown deactivation reason '{}'", s)))
    }
}

impl fmt::Display for DeactivationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (timestamp, reason, actor role) triple recorded on deactivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationAudit {
    pub occurred_at: DateTime<Utc>,
    pub reason: DeactivationReason,
    pub deactivated_by: Role,
}

impl DeactivationAudit {
    pub fn new(occurred_at: DateTime<Utc>, reason: DeactivationReason, deactivated_by: Role) -> Self {
        Self {
            occurred_at,
            reason,
            deactivated_by,
        }
    }

    /// Build an audit triple from possibly missing parts
    ///
    /// Fails with `InvalidArgument` naming every absent part.
    pub fn from_parts(
        occurred_at: Option<DateTime<Utc>>,
        reason: Option<DeactivationReason>,
        deactivated_by: Option<Role>,
    ) -> Result<Self, DomainError> {
        match (occurred_at, reason, deactivated_by) {
            (Some(occurred_at), Some(reason), Some(deactivated_by)) => {
                Ok(Self::new(occurred_at, reason, deactivated_by))
            }
            (occurred_at, reason, deactivated_by) => {
                let missing: Vec<&str> = [
                    occurred_at.is_none().then_some("occurred_at"),
                    reason.is_none().then_some("reason"),
                    deactivated_by.is_none().then_some("deactivated_by"),
                ]
                .into_iter()
                .flatten()
                .collect();

                Err(DomainError::invalid_argument(format!(
                    "Deactivation audit data is required (missing: {})",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Raw account fields as held by storage, before the invariant is checked
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: AccountId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivation_reason: Option<DeactivationReason>,
    pub deactivated_by: Option<Role>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Account entity
///
/// An active account carries no deactivation audit data; an inactive one
/// carries all of it. Every mutator preserves this and `validate_state`
/// checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Absent until the account is first saved
    id: Option<AccountId>,
    username: String,
    /// Never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    deactivated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deactivation_reason: Option<DeactivationReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deactivated_by: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new, active account
    ///
    /// The username is expected to be validated already.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            created_at,
            active: true,
            deactivated_at: None,
            deactivation_reason: None,
            deactivated_by: None,
            last_login_at: None,
        }
    }

    /// Rebuild a persisted account, rejecting records that break the
    /// active/audit invariant
    pub fn restore(record: AccountRecord) -> Result<Self, DomainError> {
        let account = Self {
            id: Some(record.id),
            username: record.username,
            password_hash: record.password_hash,
            role: record.role,
            created_at: record.created_at,
            active: record.active,
            deactivated_at: record.deactivated_at,
            deactivation_reason: record.deactivation_reason,
            deactivated_by: record.deactivated_by,
            last_login_at: record.last_login_at,
        };

        account.validate_state()?;
        Ok(account)
    }

    // Getters

    pub fn id(&self) -> Option<&AccountId> {
        self.id.as_ref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivated_at(&self) -> Option<DateTime<Utc>> {
        self.deactivated_at
    }

    pub fn deactivation_reason(&self) -> Option<DeactivationReason> {
        self.deactivation_reason
    }

    pub fn deactivated_by(&self) -> Option<Role> {
        self.deactivated_by
    }

    /// The full audit triple, if the account is deactivated
    pub fn deactivation(&self) -> Option<DeactivationAudit> {
        Some(DeactivationAudit::new(
            self.deactivated_at?,
            self.deactivation_reason?,
            self.deactivated_by?,
        ))
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    // Lifecycle

    /// Fail with `InvalidState` unless the account is active
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.active {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "Account '{}' is already deactivated",
                self.username
            )))
        }
    }

    /// Deactivate the account, recording the audit triple
    pub fn deactivate(&mut self, audit: DeactivationAudit) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.active = false;
        self.deactivated_at = Some(audit.occurred_at);
        self.deactivation_reason = Some(audit.reason);
        self.deactivated_by = Some(audit.deactivated_by);

        Ok(())
    }

    /// Reactivate the account; a no-op when already active
    pub fn activate(&mut self) {
        if self.active {
            return;
        }

        self.active = true;
        self.deactivated_at = None;
        self.deactivation_reason = None;
        self.deactivated_by = None;
    }

    /// Check the active/audit correspondence
    pub fn validate_state(&self) -> Result<(), DomainError> {
        let audit_fields_present = [
            self.deactivated_at.is_some(),
            self.deactivation_reason.is_some(),
            self.deactivated_by.is_some(),
        ];

        if self.active && audit_fields_present.iter().any(|present| *present) {
            return Err(DomainError::invalid_state(format!(
                "Active account '{}' must not carry deactivation audit data",
                self.username
            )));
        }

        if !self.active && !audit_fields_present.iter().all(|present| *present) {
            return Err(DomainError::invalid_state(format!(
                "Inactive account '{}' must carry full deactivation audit data",
                self.username
            )));
        }

        Ok(())
    }

    // Mutators

    /// Replace the credential hash (password rotation only)
    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
    }

    pub(crate) fn assign_id(&mut self, id: AccountId) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    fn create_test_account() -> Account {
        Account::new("newuser", "hashed_password", Role::User, t0())
    }

    fn audit(reason: DeactivationReason, by: Role) -> DeactivationAudit {
        DeactivationAudit::new(t0() + chrono::Duration::days(1), reason, by)
    }

    fn record(active: bool) -> AccountRecord {
        AccountRecord {
            id: AccountId::generate(),
            username: "restored".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            created_at: t0(),
            active,
            deactivated_at: None,
            deactivation_reason: None,
            deactivated_by: None,
            last_login_at: None,
        }
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Admin.can_manage_users());
        assert!(!Role::User.can_manage_users());
    }

    #[test]
    fn test_role_and_reason_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("owner".parse::<Role>().is_err());

        assert_eq!(
            "fraud-detection".parse::<DeactivationReason>().unwrap(),
            DeactivationReason::FraudDetection
        );
        for reason in DeactivationReason::ALL {
            assert_eq!(reason.as_str().parse::<DeactivationReason>().unwrap(), reason);
        }
        assert!("bored".parse::<DeactivationReason>().is_err());
    }

    #[test]
    fn test_account_creation() {
        let account = create_test_account();

        assert!(account.id().is_none());
        assert_eq!(account.username(), "newuser");
        assert_eq!(account.password_hash(), "hashed_password");
        assert_eq!(account.role(), Role::User);
        assert_eq!(account.created_at(), t0());
        assert!(account.is_active());
        assert!(account.deactivation().is_none());
        assert!(account.last_login_at().is_none());
        assert!(account.validate_state().is_ok());
    }

    #[test]
    fn test_deactivate_then_activate_round_trip() {
        let mut account = create_test_account();
        let audit = audit(DeactivationReason::SecurityBreach, Role::Admin);

        account.deactivate(audit).unwrap();

        assert!(!account.is_active());
        assert_eq!(account.deactivated_at(), Some(audit.occurred_at));
        assert_eq!(account.deactivation_reason(), Some(DeactivationReason::SecurityBreach));
        assert_eq!(account.deactivated_by(), Some(Role::Admin));
        assert_eq!(account.deactivation(), Some(audit));
        assert!(account.validate_state().is_ok());

        account.activate();

        assert!(account.is_active());
        assert!(account.deactivated_at().is_none());
        assert!(account.deactivation_reason().is_none());
        assert!(account.deactivated_by().is_none());
        assert!(account.validate_state().is_ok());
    }

    #[test]
    fn test_double_deactivation_is_rejected() {
        let mut account = create_test_account();
        account
            .deactivate(audit(DeactivationReason::UserRequest, Role::User))
            .unwrap();
        let before = account.clone();

        for reason in DeactivationReason::ALL {
            for by in [Role::Admin, Role::User] {
                let result = account.deactivate(audit(reason, by));
                assert!(matches!(result, Err(DomainError::InvalidState { .. })));
            }
        }

        assert_eq!(account, before);
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut account = create_test_account();
        let before = account.clone();

        account.activate();
        account.activate();

        assert_eq!(account, before);
    }

    #[test]
    fn test_repeated_lifecycle_keeps_invariant() {
        let mut account = create_test_account();

        for reason in DeactivationReason::ALL {
            account.deactivate(audit(reason, Role::Admin)).unwrap();
            assert!(account.validate_state().is_ok());
            assert_eq!(account.deactivation_reason(), Some(reason));

            account.activate();
            assert!(account.validate_state().is_ok());
            assert!(account.deactivation().is_none());
        }
    }

    #[test]
    fn test_audit_from_parts_requires_every_field() {
        let result = DeactivationAudit::from_parts(Some(t0()), None, Some(Role::Admin));
        match result {
            Err(DomainError::InvalidArgument { message }) => {
                assert!(message.contains("reason"));
                assert!(!message.contains("occurred_at"));
            }
            other => panic!("expected InvalidArgument, got {:?}", other),
        }

        assert!(DeactivationAudit::from_parts(None, None, None).is_err());
        assert!(
            DeactivationAudit::from_parts(
                Some(t0()),
                Some(DeactivationReason::Inactivity),
                Some(Role::User)
            )
            .is_ok()
        );
    }

    #[test]
    fn test_restore_consistent_records() {
        let active = Account::restore(record(true)).unwrap();
        assert!(active.is_active());
        assert!(active.id().is_some());

        let mut inactive = record(false);
        inactive.deactivated_at = Some(t0());
        inactive.deactivation_reason = Some(DeactivationReason::Inactivity);
        inactive.deactivated_by = Some(Role::Admin);
        let inactive = Account::restore(inactive).unwrap();
        assert!(!inactive.is_active());
    }

    #[test]
    fn test_restore_rejects_active_record_with_audit_data() {
        let mut broken = record(true);
        broken.deactivation_reason = Some(DeactivationReason::AdminAction);

        let result = Account::restore(broken);
        assert!(matches!(result, Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn test_restore_rejects_inactive_record_with_partial_audit() {
        let mut broken = record(false);
        broken.deactivated_at = Some(t0());
        broken.deactivated_by = Some(Role::Admin);

        let result = Account::restore(broken);
        assert!(matches!(result, Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn test_set_password_hash() {
        let mut account = create_test_account();

        account.set_password_hash("new_hash");
        assert_eq!(account.password_hash(), "new_hash");
        assert!(account.is_active());
    }

    #[test]
    fn test_serialization_excludes_password() {
        let mut account = create_test_account();
        account.assign_id(AccountId::generate());

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"role\":\"USER\""));
        assert!(!json.contains("deactivated_at"));
    }
}
