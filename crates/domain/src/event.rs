use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use vigil_core::{AppError, EventId};

use crate::{AuditAction, RiskLevel, is_sensitive};

/// Opaque key-value payload attached to an audit event.
pub type AuditDetails = serde_json::Map<String, Value>;

/// Result of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation completed.
    Success,
    /// The operation was attempted and failed.
    Failure,
    /// The operation was refused before it ran.
    Blocked,
}

impl AuditOutcome {
    /// Returns a stable storage value for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Blocked => "blocked",
        }
    }

    /// Returns all outcomes.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Success, Self::Failure, Self::Blocked]
    }
}

impl Display for AuditOutcome {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AuditOutcome {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "blocked" => Ok(Self::Blocked),
            _ => Err(AppError::Validation(format!(
                "unknown audit outcome '{value}'"
            ))),
        }
    }
}

/// Coarse location supplied by an upstream collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geolocation {
    /// Country name or code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Region or state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Authenticated-encryption envelope that replaces sensitive details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Always `true`; marks the envelope on the wire.
    pub encrypted: bool,
    /// Hex-encoded ciphertext.
    pub data: String,
    /// Hex-encoded initialization vector.
    pub iv: String,
    /// Hex-encoded authentication tag.
    pub tag: String,
}

impl EncryptedPayload {
    /// Creates an envelope from hex-encoded parts.
    #[must_use]
    pub fn new(data: String, iv: String, tag: String) -> Self {
        Self {
            encrypted: true,
            data,
            iv,
            tag,
        }
    }

    /// Returns whether every part is present and valid hex.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.encrypted && is_hex(&self.data) && is_hex(&self.iv) && is_hex(&self.tag)
    }
}

const ENVELOPE_FIELDS: usize = 4;

fn is_hex(value: &str) -> bool {
    !value.is_empty()
        && value.len() % 2 == 0
        && value.bytes().all(|byte| byte.is_ascii_hexdigit())
}

/// Details as persisted: either sanitized plaintext or an encrypted envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventDetails {
    /// Encrypted envelope.
    Encrypted(EncryptedPayload),
    /// Sanitized plaintext.
    Plain(AuditDetails),
}

impl EventDetails {
    /// Returns the envelope when the details are still encrypted.
    #[must_use]
    pub fn as_encrypted(&self) -> Option<&EncryptedPayload> {
        match self {
            Self::Encrypted(payload) => Some(payload),
            Self::Plain(_) => None,
        }
    }

    /// Returns the plaintext map when the details are not encrypted.
    #[must_use]
    pub fn as_plain(&self) -> Option<&AuditDetails> {
        match self {
            Self::Plain(details) => Some(details),
            Self::Encrypted(_) => None,
        }
    }

    fn from_map(map: AuditDetails) -> Self {
        if map.len() == ENVELOPE_FIELDS && map.get("encrypted") == Some(&Value::Bool(true)) {
            if let Ok(payload) = serde_json::from_value::<EncryptedPayload>(Value::Object(map.clone()))
            {
                if payload.is_well_formed() {
                    return Self::Encrypted(payload);
                }
            }
        }

        Self::Plain(map)
    }

    /// Downgrades an envelope back to plaintext when `action` is never encrypted.
    fn for_action(self, action: AuditAction) -> Self {
        match self {
            Self::Encrypted(payload) if !is_sensitive(action) => {
                match serde_json::to_value(&payload) {
                    Ok(Value::Object(map)) => Self::Plain(map),
                    _ => Self::Encrypted(payload),
                }
            }
            details => details,
        }
    }
}

impl<'de> Deserialize<'de> for EventDetails {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        AuditDetails::deserialize(deserializer).map(Self::from_map)
    }
}

impl From<AuditDetails> for EventDetails {
    fn from(value: AuditDetails) -> Self {
        Self::Plain(value)
    }
}

impl From<EncryptedPayload> for EventDetails {
    fn from(value: EncryptedPayload) -> Self {
        Self::Encrypted(value)
    }
}

/// Immutable record of one security-relevant action and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredAuditEvent")]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// Creation instant in UTC.
    pub timestamp: DateTime<Utc>,
    /// Acting user if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Session of the acting user if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Client address if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Audited action.
    pub action: AuditAction,
    /// Object or domain acted upon.
    pub resource: String,
    /// Specific instance acted upon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Outcome of the operation.
    pub outcome: AuditOutcome,
    /// Sanitized or encrypted payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
    /// Assigned severity.
    pub risk_level: RiskLevel,
    /// Request tracing identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Coarse location if supplied upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
}

/// Wire shape of [`AuditEvent`]; envelopes only count for sensitive actions.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAuditEvent {
    id: EventId,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    action: AuditAction,
    resource: String,
    #[serde(default)]
    resource_id: Option<String>,
    outcome: AuditOutcome,
    #[serde(default)]
    details: Option<EventDetails>,
    risk_level: RiskLevel,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    geolocation: Option<Geolocation>,
}

impl From<StoredAuditEvent> for AuditEvent {
    fn from(stored: StoredAuditEvent) -> Self {
        let action = stored.action;
        Self {
            id: stored.id,
            timestamp: stored.timestamp,
            user_id: stored.user_id,
            session_id: stored.session_id,
            ip_address: stored.ip_address,
            user_agent: stored.user_agent,
            action,
            resource: stored.resource,
            resource_id: stored.resource_id,
            outcome: stored.outcome,
            details: stored.details.map(|details| details.for_action(action)),
            risk_level: stored.risk_level,
            correlation_id: stored.correlation_id,
            geolocation: stored.geolocation,
        }
    }
}

impl AuditEvent {
    /// Creates an event stamped now with no actor or context attributes.
    #[must_use]
    pub fn new(
        action: AuditAction,
        resource: impl Into<String>,
        outcome: AuditOutcome,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            user_id: None,
            session_id: None,
            ip_address: None,
            user_agent: None,
            action,
            resource: resource.into(),
            resource_id: None,
            outcome,
            details: None,
            risk_level,
            correlation_id: None,
            geolocation: None,
        }
    }

    /// Returns whether the details are still an encrypted envelope.
    #[must_use]
    pub fn has_encrypted_details(&self) -> bool {
        self.details
            .as_ref()
            .is_some_and(|details| details.as_encrypted().is_some())
    }
}
