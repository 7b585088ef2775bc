//! Audit domain model: taxonomy, risk policy, sensitivity rules, queries and
//! aggregates.

#![forbid(unsafe_code)]

mod action;
mod event;
mod query;
mod risk;
mod sensitivity;
mod statistics;

pub use action::{ActionCategory, AuditAction};
pub use event::{
    AuditDetails, AuditEvent, AuditOutcome, EncryptedPayload, EventDetails, Geolocation,
};
pub use query::{AuditQueryFilters, DEFAULT_QUERY_LIMIT, RawAuditQuery, retention_cutoff};
pub use risk::{RiskLevel, classify};
pub use sensitivity::{REDACTED_MARKER, is_redacted_key, is_sensitive, sanitize};
pub use statistics::{AuditStatistics, StatisticsTimeframe, TOP_ENTRY_LIMIT, TopEntry};
