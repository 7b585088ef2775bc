use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::AppError;

/// Closed taxonomy of audited actions.
///
/// Adding a variant is a schema change: the risk classifier, sensitivity
/// policy and statistics all key off these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditAction {
    /// Successful or failed sign-in attempt.
    #[serde(rename = "auth.login")]
    AuthLogin,
    /// Session ended by the user.
    #[serde(rename = "auth.logout")]
    AuthLogout,
    /// Account registration.
    #[serde(rename = "auth.register")]
    AuthRegister,
    /// Password changed by the account owner.
    #[serde(rename = "auth.password_change")]
    AuthPasswordChange,
    /// Password reset through a recovery flow.
    #[serde(rename = "auth.password_reset")]
    AuthPasswordReset,
    /// Access token refreshed.
    #[serde(rename = "auth.token_refresh")]
    AuthTokenRefresh,
    /// Multi-factor authentication enabled.
    #[serde(rename = "auth.mfa_enable")]
    AuthMfaEnable,
    /// Multi-factor authentication disabled.
    #[serde(rename = "auth.mfa_disable")]
    AuthMfaDisable,
    /// Session expired through inactivity.
    #[serde(rename = "auth.session_timeout")]
    AuthSessionTimeout,
    /// Authorization check passed.
    #[serde(rename = "authz.access_granted")]
    AuthzAccessGranted,
    /// Authorization check rejected.
    #[serde(rename = "authz.access_denied")]
    AuthzAccessDenied,
    /// Subject gained privileges beyond its role.
    #[serde(rename = "authz.privilege_escalation")]
    AuthzPrivilegeEscalation,
    /// Role assignment changed.
    #[serde(rename = "authz.role_change")]
    AuthzRoleChange,
    /// Record created.
    #[serde(rename = "data.create")]
    DataCreate,
    /// Record read.
    #[serde(rename = "data.read")]
    DataRead,
    /// Record updated.
    #[serde(rename = "data.update")]
    DataUpdate,
    /// Record deleted.
    #[serde(rename = "data.delete")]
    DataDelete,
    /// Data exported out of the system.
    #[serde(rename = "data.export")]
    DataExport,
    /// Data imported into the system.
    #[serde(rename = "data.import")]
    DataImport,
    /// Data backup taken.
    #[serde(rename = "data.backup")]
    DataBackup,
    /// Data restored from backup.
    #[serde(rename = "data.restore")]
    DataRestore,
    /// An attack pattern was detected.
    #[serde(rename = "security.attack_detected")]
    SecurityAttackDetected,
    /// A caller exceeded a rate limit.
    #[serde(rename = "security.rate_limit_exceeded")]
    SecurityRateLimitExceeded,
    /// Behaviour flagged as suspicious.
    #[serde(rename = "security.suspicious_activity")]
    SecuritySuspiciousActivity,
    /// A security policy was violated.
    #[serde(rename = "security.policy_violation")]
    SecurityPolicyViolation,
    /// Encryption or decryption failed.
    #[serde(rename = "security.encryption_failure")]
    SecurityEncryptionFailure,
    /// Certificate validation or renewal failed.
    #[serde(rename = "security.certificate_error")]
    SecurityCertificateError,
    /// Process started.
    #[serde(rename = "system.startup")]
    SystemStartup,
    /// Process shutting down.
    #[serde(rename = "system.shutdown")]
    SystemShutdown,
    /// Runtime configuration changed.
    #[serde(rename = "system.config_change")]
    SystemConfigChange,
    /// System-level backup.
    #[serde(rename = "system.backup")]
    SystemBackup,
    /// Maintenance window activity.
    #[serde(rename = "system.maintenance")]
    SystemMaintenance,
    /// Administrator created a user.
    #[serde(rename = "admin.user_create")]
    AdminUserCreate,
    /// Administrator deleted a user.
    #[serde(rename = "admin.user_delete")]
    AdminUserDelete,
    /// Administrator suspended a user.
    #[serde(rename = "admin.user_suspend")]
    AdminUserSuspend,
    /// Administrator changed global settings.
    #[serde(rename = "admin.settings_change")]
    AdminSettingsChange,
    /// Administrator accessed privileged system surfaces.
    #[serde(rename = "admin.system_access")]
    AdminSystemAccess,
}

/// Top-level family an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// `auth.*`
    Auth,
    /// `authz.*`
    Authz,
    /// `data.*`
    Data,
    /// `security.*`
    Security,
    /// `system.*`
    System,
    /// `admin.*`
    Admin,
}

impl ActionCategory {
    /// Returns the storage prefix without the trailing dot.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Authz => "authz",
            Self::Data => "data",
            Self::Security => "security",
            Self::System => "system",
            Self::Admin => "admin",
        }
    }
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthLogin => "auth.login",
            Self::AuthLogout => "auth.logout",
            Self::AuthRegister => "auth.register",
            Self::AuthPasswordChange => "auth.password_change",
            Self::AuthPasswordReset => "auth.password_reset",
            Self::AuthTokenRefresh => "auth.token_refresh",
            Self::AuthMfaEnable => "auth.mfa_enable",
            Self::AuthMfaDisable => "auth.mfa_disable",
            Self::AuthSessionTimeout => "auth.session_timeout",
            Self::AuthzAccessGranted => "authz.access_granted",
            Self::AuthzAccessDenied => "authz.access_denied",
            Self::AuthzPrivilegeEscalation => "authz.privilege_escalation",
            Self::AuthzRoleChange => "authz.role_change",
            Self::DataCreate => "data.create",
            Self::DataRead => "data.read",
            Self::DataUpdate => "data.update",
            Self::DataDelete => "data.delete",
            Self::DataExport => "data.export",
            Self::DataImport => "data.import",
            Self::DataBackup => "data.backup",
            Self::DataRestore => "data.restore",
            Self::SecurityAttackDetected => "security.attack_detected",
            Self::SecurityRateLimitExceeded => "security.rate_limit_exceeded",
            Self::SecuritySuspiciousActivity => "security.suspicious_activity",
            Self::SecurityPolicyViolation => "security.policy_violation",
            Self::SecurityEncryptionFailure => "security.encryption_failure",
            Self::SecurityCertificateError => "security.certificate_error",
            Self::SystemStartup => "system.startup",
            Self::SystemShutdown => "system.shutdown",
            Self::SystemConfigChange => "system.config_change",
            Self::SystemBackup => "system.backup",
            Self::SystemMaintenance => "system.maintenance",
            Self::AdminUserCreate => "admin.user_create",
            Self::AdminUserDelete => "admin.user_delete",
            Self::AdminUserSuspend => "admin.user_suspend",
            Self::AdminSettingsChange => "admin.settings_change",
            Self::AdminSystemAccess => "admin.system_access",
        }
    }

    /// Returns the family this action belongs to.
    #[must_use]
    pub fn category(&self) -> ActionCategory {
        match self {
            Self::AuthLogin
            | Self::AuthLogout
            | Self::AuthRegister
            | Self::AuthPasswordChange
            | Self::AuthPasswordReset
            | Self::AuthTokenRefresh
            | Self::AuthMfaEnable
            | Self::AuthMfaDisable
            | Self::AuthSessionTimeout => ActionCategory::Auth,
            Self::AuthzAccessGranted
            | Self::AuthzAccessDenied
            | Self::AuthzPrivilegeEscalation
            | Self::AuthzRoleChange => ActionCategory::Authz,
            Self::DataCreate
            | Self::DataRead
            | Self::DataUpdate
            | Self::DataDelete
            | Self::DataExport
            | Self::DataImport
            | Self::DataBackup
            | Self::DataRestore => ActionCategory::Data,
            Self::SecurityAttackDetected
            | Self::SecurityRateLimitExceeded
            | Self::SecuritySuspiciousActivity
            | Self::SecurityPolicyViolation
            | Self::SecurityEncryptionFailure
            | Self::SecurityCertificateError => ActionCategory::Security,
            Self::SystemStartup
            | Self::SystemShutdown
            | Self::SystemConfigChange
            | Self::SystemBackup
            | Self::SystemMaintenance => ActionCategory::System,
            Self::AdminUserCreate
            | Self::AdminUserDelete
            | Self::AdminUserSuspend
            | Self::AdminSettingsChange
            | Self::AdminSystemAccess => ActionCategory::Admin,
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AuditAction] = &[
            AuditAction::AuthLogin,
            AuditAction::AuthLogout,
            AuditAction::AuthRegister,
            AuditAction::AuthPasswordChange,
            AuditAction::AuthPasswordReset,
            AuditAction::AuthTokenRefresh,
            AuditAction::AuthMfaEnable,
            AuditAction::AuthMfaDisable,
            AuditAction::AuthSessionTimeout,
            AuditAction::AuthzAccessGranted,
            AuditAction::AuthzAccessDenied,
            AuditAction::AuthzPrivilegeEscalation,
            AuditAction::AuthzRoleChange,
            AuditAction::DataCreate,
            AuditAction::DataRead,
            AuditAction::DataUpdate,
            AuditAction::DataDelete,
            AuditAction::DataExport,
            AuditAction::DataImport,
            AuditAction::DataBackup,
            AuditAction::DataRestore,
            AuditAction::SecurityAttackDetected,
            AuditAction::SecurityRateLimitExceeded,
            AuditAction::SecuritySuspiciousActivity,
            AuditAction::SecurityPolicyViolation,
            AuditAction::SecurityEncryptionFailure,
            AuditAction::SecurityCertificateError,
            AuditAction::SystemStartup,
            AuditAction::SystemShutdown,
            AuditAction::SystemConfigChange,
            AuditAction::SystemBackup,
            AuditAction::SystemMaintenance,
            AuditAction::AdminUserCreate,
            AuditAction::AdminUserDelete,
            AuditAction::AdminUserSuspend,
            AuditAction::AdminSettingsChange,
            AuditAction::AdminSystemAccess,
        ];

        ALL
    }
}

impl Display for AuditAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ActionCategory, AuditAction};

    #[test]
    fn every_action_roundtrips_its_storage_value() {
        for action in AuditAction::all() {
            let restored = AuditAction::from_str(action.as_str());
            assert!(matches!(restored, Ok(value) if value == *action));
        }
    }

    #[test]
    fn storage_value_starts_with_category_prefix() {
        for action in AuditAction::all() {
            let prefix = format!("{}.", action.category().as_str());
            assert!(action.as_str().starts_with(prefix.as_str()), "{action}");
        }
    }

    #[test]
    fn taxonomy_has_thirty_seven_actions() {
        assert_eq!(AuditAction::all().len(), 37);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(AuditAction::from_str("auth.teleport").is_err());
    }

    #[test]
    fn serde_uses_storage_value() {
        let encoded = serde_json::to_string(&AuditAction::AuthzPrivilegeEscalation);
        assert!(matches!(encoded.as_deref(), Ok("\"authz.privilege_escalation\"")));

        let decoded = serde_json::from_str::<AuditAction>("\"admin.user_delete\"");
        assert!(matches!(decoded, Ok(AuditAction::AdminUserDelete)));
        assert_eq!(AuditAction::AdminUserDelete.category(), ActionCategory::Admin);
    }
}
