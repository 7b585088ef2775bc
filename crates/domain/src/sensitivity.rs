use serde_json::Value;

use crate::{AuditAction, AuditDetails};

/// Marker written in place of redacted detail values.
pub const REDACTED_MARKER: &str = "[REDACTED]";

const SENSITIVE_ACTIONS: &[AuditAction] = &[
    AuditAction::AuthLogin,
    AuditAction::AuthRegister,
    AuditAction::AuthPasswordChange,
    AuditAction::AuthPasswordReset,
    AuditAction::DataExport,
    AuditAction::AdminUserCreate,
    AuditAction::AdminSettingsChange,
];

const REDACTED_KEY_FRAGMENTS: &[&str] = &["password", "token", "secret", "key", "credential"];

/// Returns whether details recorded for this action must be encrypted at rest.
#[must_use]
pub fn is_sensitive(action: AuditAction) -> bool {
    SENSITIVE_ACTIONS.contains(&action)
}

/// Returns whether a detail key names credential material.
#[must_use]
pub fn is_redacted_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    REDACTED_KEY_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
}

/// Returns a shallow copy of `details` with credential values replaced.
///
/// Only top-level keys are inspected. Applies to every event whether or not it
/// is later encrypted.
#[must_use]
pub fn sanitize(details: &AuditDetails) -> AuditDetails {
    details
        .iter()
        .map(|(key, value)| {
            if is_redacted_key(key) {
                (key.clone(), Value::String(REDACTED_MARKER.to_owned()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}
