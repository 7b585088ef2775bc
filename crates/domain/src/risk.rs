use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::AppError;

use crate::{AuditAction, AuditOutcome};

/// Ordered severity assigned to every stored audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Routine activity.
    Low,
    /// Worth reviewing.
    Medium,
    /// Requires attention.
    High,
    /// Requires immediate attention.
    Critical,
}

impl RiskLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns all levels in ascending order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }

    /// Whether events at this level are mirrored to the general log.
    #[must_use]
    pub fn is_alerting(&self) -> bool {
        *self >= Self::High
    }
}

impl Display for RiskLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown risk level '{value}'"
            ))),
        }
    }
}

/// Maps an action and its outcome to a risk level.
///
/// Rules are evaluated in order and the first match wins. A failed outcome
/// raises the level by one step within each rule.
#[must_use]
pub fn classify(action: AuditAction, outcome: AuditOutcome) -> RiskLevel {
    let name = action.as_str();
    let failed = outcome == AuditOutcome::Failure;

    if name.starts_with("admin.")
        || name.contains("delete")
        || action == AuditAction::AuthzPrivilegeEscalation
    {
        return if failed {
            RiskLevel::Critical
        } else {
            RiskLevel::High
        };
    }

    if name.starts_with("security.")
        || name.contains("password")
        || action == AuditAction::DataExport
    {
        return if failed {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
    }

    if name.starts_with("auth.") || name.starts_with("data.") {
        return if failed {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
    }

    RiskLevel::Low
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{RiskLevel, classify};
    use crate::{AuditAction, AuditOutcome};

    fn any_action() -> impl Strategy<Value = AuditAction> {
        proptest::sample::select(AuditAction::all().to_vec())
    }

    fn any_outcome() -> impl Strategy<Value = AuditOutcome> {
        proptest::sample::select(AuditOutcome::all().to_vec())
    }

    #[test]
    fn admin_delete_escalates_to_critical_on_failure() {
        assert_eq!(
            classify(AuditAction::AdminUserDelete, AuditOutcome::Failure),
            RiskLevel::Critical
        );
        assert_eq!(
            classify(AuditAction::AdminUserDelete, AuditOutcome::Success),
            RiskLevel::High
        );
    }

    #[test]
    fn login_failure_is_medium() {
        assert_eq!(
            classify(AuditAction::AuthLogin, AuditOutcome::Failure),
            RiskLevel::Medium
        );
        assert_eq!(
            classify(AuditAction::AuthLogin, AuditOutcome::Success),
            RiskLevel::Low
        );
    }

    #[test]
    fn password_actions_follow_the_security_rule() {
        assert_eq!(
            classify(AuditAction::AuthPasswordChange, AuditOutcome::Success),
            RiskLevel::Medium
        );
        assert_eq!(
            classify(AuditAction::AuthPasswordReset, AuditOutcome::Failure),
            RiskLevel::High
        );
    }

    #[test]
    fn data_delete_matches_the_delete_rule_before_the_data_rule() {
        assert_eq!(
            classify(AuditAction::DataDelete, AuditOutcome::Success),
            RiskLevel::High
        );
        assert_eq!(
            classify(AuditAction::DataExport, AuditOutcome::Failure),
            RiskLevel::High
        );
    }

    #[test]
    fn privilege_escalation_is_treated_like_admin() {
        assert_eq!(
            classify(AuditAction::AuthzPrivilegeEscalation, AuditOutcome::Blocked),
            RiskLevel::High
        );
    }

    #[test]
    fn blocked_outcome_does_not_escalate() {
        assert_eq!(
            classify(AuditAction::SecurityAttackDetected, AuditOutcome::Blocked),
            RiskLevel::Medium
        );
    }

    #[test]
    fn unmatched_families_are_low() {
        assert_eq!(
            classify(AuditAction::SystemStartup, AuditOutcome::Failure),
            RiskLevel::Low
        );
        assert_eq!(
            classify(AuditAction::AuthzAccessDenied, AuditOutcome::Failure),
            RiskLevel::Low
        );
    }

    #[test]
    fn risk_level_roundtrips_storage_value() {
        for level in RiskLevel::all() {
            let parsed = level.as_str().parse::<RiskLevel>();
            assert!(matches!(parsed, Ok(value) if value == *level));
        }
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(action in any_action(), outcome in any_outcome()) {
            prop_assert_eq!(classify(action, outcome), classify(action, outcome));
        }

        #[test]
        fn failure_never_lowers_risk(action in any_action()) {
            let on_failure = classify(action, AuditOutcome::Failure);
            let on_success = classify(action, AuditOutcome::Success);
            prop_assert!(on_failure >= on_success);
        }
    }
}
