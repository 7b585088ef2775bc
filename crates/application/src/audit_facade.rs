//! Per-domain shortcuts over [`AuditLogger::log_event`].
//!
//! Each helper only pre-binds the action, resource and default risk level.

use serde_json::Value;

use vigil_domain::{AuditAction, AuditEvent, AuditOutcome, RiskLevel};

use crate::{AuditLogger, LogEventOptions};

const USER_RESOURCE: &str = "user";
const SECURITY_RESOURCE: &str = "security";
const SYSTEM_RESOURCE: &str = "system";
const SETTINGS_RESOURCE: &str = "settings";

impl AuditLogger {
    /// Authentication helpers.
    #[must_use]
    pub fn auth(&self) -> AuthAudit<'_> {
        AuthAudit { logger: self }
    }

    /// Data mutation and access helpers.
    #[must_use]
    pub fn data(&self) -> DataAudit<'_> {
        DataAudit { logger: self }
    }

    /// Security incident helpers.
    #[must_use]
    pub fn security(&self) -> SecurityAudit<'_> {
        SecurityAudit { logger: self }
    }

    /// Administrative action helpers.
    #[must_use]
    pub fn admin(&self) -> AdminAudit<'_> {
        AdminAudit { logger: self }
    }

    /// Process lifecycle helpers.
    #[must_use]
    pub fn system(&self) -> SystemAudit<'_> {
        SystemAudit { logger: self }
    }
}

fn default_risk(options: LogEventOptions, risk_level: RiskLevel) -> LogEventOptions {
    LogEventOptions {
        risk_level: options.risk_level.or(Some(risk_level)),
        ..options
    }
}

fn with_detail(mut options: LogEventOptions, key: &str, value: &str) -> LogEventOptions {
    options
        .details
        .get_or_insert_with(Default::default)
        .insert(key.to_owned(), Value::String(value.to_owned()));
    options
}

/// Authentication audit helpers.
pub struct AuthAudit<'a> {
    logger: &'a AuditLogger,
}

impl AuthAudit<'_> {
    /// Records a sign-in attempt.
    pub async fn login(&self, outcome: AuditOutcome, options: LogEventOptions) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::AuthLogin, USER_RESOURCE, outcome, options)
            .await
    }

    /// Records a sign-out.
    pub async fn logout(&self, options: LogEventOptions) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::AuthLogout,
                USER_RESOURCE,
                AuditOutcome::Success,
                options,
            )
            .await
    }

    /// Records an account registration.
    pub async fn register(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::AuthRegister, USER_RESOURCE, outcome, options)
            .await
    }

    /// Records a password change by the account owner.
    pub async fn password_change(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::AuthPasswordChange,
                USER_RESOURCE,
                outcome,
                options,
            )
            .await
    }

    /// Records a password reset.
    pub async fn password_reset(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::AuthPasswordReset,
                USER_RESOURCE,
                outcome,
                options,
            )
            .await
    }

    /// Records a token refresh.
    pub async fn token_refresh(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::AuthTokenRefresh, USER_RESOURCE, outcome, options)
            .await
    }

    /// Records MFA enrollment.
    pub async fn mfa_enable(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::AuthMfaEnable, USER_RESOURCE, outcome, options)
            .await
    }

    /// Records MFA removal.
    pub async fn mfa_disable(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::AuthMfaDisable, USER_RESOURCE, outcome, options)
            .await
    }
}

/// Data audit helpers. `resource` names the record type, such as `run`.
pub struct DataAudit<'a> {
    logger: &'a AuditLogger,
}

impl DataAudit<'_> {
    /// Records a record creation.
    pub async fn create(
        &self,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::DataCreate, resource, outcome, options)
            .await
    }

    /// Records a record read.
    pub async fn read(
        &self,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::DataRead, resource, outcome, options)
            .await
    }

    /// Records a record update.
    pub async fn update(
        &self,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::DataUpdate, resource, outcome, options)
            .await
    }

    /// Records a record deletion, `high` risk unless overridden.
    pub async fn delete(
        &self,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::DataDelete,
                resource,
                outcome,
                default_risk(options, RiskLevel::High),
            )
            .await
    }

    /// Records a bulk export.
    pub async fn export(
        &self,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(AuditAction::DataExport, resource, outcome, options)
            .await
    }
}

/// Security incident helpers.
pub struct SecurityAudit<'a> {
    logger: &'a AuditLogger,
}

impl SecurityAudit<'_> {
    /// Records a blocked attack, `critical` unless overridden.
    pub async fn attack_detected(
        &self,
        attack_type: &str,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        let options = with_detail(options, "attackType", attack_type);
        self.logger
            .log_event(
                AuditAction::SecurityAttackDetected,
                SECURITY_RESOURCE,
                AuditOutcome::Blocked,
                default_risk(options, RiskLevel::Critical),
            )
            .await
    }

    /// Records a throttled request against `endpoint`, `medium` unless
    /// overridden.
    pub async fn rate_limit_exceeded(
        &self,
        endpoint: &str,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::SecurityRateLimitExceeded,
                endpoint,
                AuditOutcome::Blocked,
                default_risk(options, RiskLevel::Medium),
            )
            .await
    }

    /// Records suspicious behaviour, `high` unless overridden.
    pub async fn suspicious_activity(
        &self,
        description: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        let options = with_detail(options, "description", description);
        self.logger
            .log_event(
                AuditAction::SecuritySuspiciousActivity,
                SECURITY_RESOURCE,
                outcome,
                default_risk(options, RiskLevel::High),
            )
            .await
    }

    /// Records a blocked policy violation, `high` unless overridden.
    pub async fn policy_violation(
        &self,
        policy: &str,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        let options = with_detail(options, "policy", policy);
        self.logger
            .log_event(
                AuditAction::SecurityPolicyViolation,
                SECURITY_RESOURCE,
                AuditOutcome::Blocked,
                default_risk(options, RiskLevel::High),
            )
            .await
    }
}

/// Administrative action helpers.
pub struct AdminAudit<'a> {
    logger: &'a AuditLogger,
}

impl AdminAudit<'_> {
    /// Records creation of `target_user_id` by an administrator.
    pub async fn user_create(
        &self,
        target_user_id: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::AdminUserCreate,
                USER_RESOURCE,
                outcome,
                options.with_resource_id(target_user_id),
            )
            .await
    }

    /// Records deletion of `target_user_id` by an administrator.
    pub async fn user_delete(
        &self,
        target_user_id: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::AdminUserDelete,
                USER_RESOURCE,
                outcome,
                options.with_resource_id(target_user_id),
            )
            .await
    }

    /// Records a settings change.
    pub async fn settings_change(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::AdminSettingsChange,
                SETTINGS_RESOURCE,
                outcome,
                options,
            )
            .await
    }
}

/// Process lifecycle helpers.
pub struct SystemAudit<'a> {
    logger: &'a AuditLogger,
}

impl SystemAudit<'_> {
    /// Records process start.
    pub async fn startup(&self, options: LogEventOptions) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::SystemStartup,
                SYSTEM_RESOURCE,
                AuditOutcome::Success,
                options,
            )
            .await
    }

    /// Records orderly shutdown.
    pub async fn shutdown(&self, options: LogEventOptions) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::SystemShutdown,
                SYSTEM_RESOURCE,
                AuditOutcome::Success,
                options,
            )
            .await
    }

    /// Records a runtime configuration change.
    pub async fn config_change(
        &self,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        self.logger
            .log_event(
                AuditAction::SystemConfigChange,
                SYSTEM_RESOURCE,
                outcome,
                options,
            )
            .await
    }
}
