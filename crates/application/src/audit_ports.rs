use std::fmt::{Display, Formatter};

use async_trait::async_trait;

use vigil_core::AppResult;
use vigil_domain::{AuditDetails, AuditEvent, AuditQueryFilters, EncryptedPayload};

/// Persistence port for audit events.
///
/// Implementations must be safe under concurrent `store`, `query` and
/// `cleanup` calls. Errors are returned to the caller, which decides how to
/// degrade; the audit logger never lets them reach the audited operation.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Short label used in logs, such as `memory` or `file`.
    fn backend_name(&self) -> &'static str;

    /// Persists one event.
    async fn store(&self, event: AuditEvent) -> AppResult<()>;

    /// Returns events matching every filter, newest first, paginated.
    async fn query(&self, filters: &AuditQueryFilters) -> AppResult<Vec<AuditEvent>>;

    /// Removes events older than `now - retention_days` and returns how many.
    async fn cleanup(&self, retention_days: u32) -> AppResult<u64>;
}

/// Port for authenticated encryption of event details.
pub trait FieldEncryptor: Send + Sync {
    /// Encrypts a details map with a fresh IV.
    fn encrypt(&self, details: &AuditDetails) -> AppResult<EncryptedPayload>;

    /// Verifies and decrypts an envelope.
    fn decrypt(&self, payload: &EncryptedPayload) -> AppResult<AuditDetails>;
}

/// Write-only counter sink fed by the audit logger.
pub trait CounterSink: Send + Sync {
    /// Adds one to the named counter.
    fn increment(&self, counter: &str);
}

/// Counter sink that discards every increment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCounterSink;

impl CounterSink for NoopCounterSink {
    fn increment(&self, _counter: &str) {}
}

/// Stage of the pipeline where a suppressed failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditFailureKind {
    /// Backend rejected a write.
    Store,
    /// Backend rejected a read.
    Query,
    /// Details could not be encrypted.
    Encryption,
    /// An envelope could not be decrypted.
    Decryption,
    /// Statistics could not be computed.
    Statistics,
    /// Retention cleanup failed.
    Cleanup,
}

impl AuditFailureKind {
    /// Returns the condition label written to logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store-failure",
            Self::Query => "query-failure",
            Self::Encryption => "encryption-failure",
            Self::Decryption => "decryption-failure",
            Self::Statistics => "statistics-failure",
            Self::Cleanup => "cleanup-failure",
        }
    }
}

impl Display for AuditFailureKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A failure the audit pipeline absorbed instead of propagating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFailure {
    /// Pipeline stage.
    pub kind: AuditFailureKind,
    /// Error description.
    pub message: String,
}

/// Receives every failure the audit pipeline suppresses.
pub trait AuditFailureSink: Send + Sync {
    /// Records one suppressed failure.
    fn record(&self, failure: AuditFailure);
}
