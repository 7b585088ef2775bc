//! Application services and ports for the audit pipeline.

#![forbid(unsafe_code)]

mod audit_config;
mod audit_facade;
mod audit_logger;
mod audit_ports;
mod request_context;
mod retention_sweep;

pub use audit_config::{
    AuditConfig, DEFAULT_CLEANUP_INTERVAL_HOURS, DEFAULT_LOG_PATH, DEFAULT_MAX_EVENTS,
    DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS, RetentionPolicy, StorageConfig,
};
pub use audit_facade::{AdminAudit, AuthAudit, DataAudit, SecurityAudit, SystemAudit};
pub use audit_logger::{AuditLogger, LogEventOptions};
pub use audit_ports::{
    AuditFailure, AuditFailureKind, AuditFailureSink, AuditStorage, CounterSink, FieldEncryptor,
    NoopCounterSink,
};
pub use request_context::{RequestContext, UNKNOWN_CLIENT_IP};
pub use retention_sweep::{RetentionSweep, RetentionSweepHandle};
