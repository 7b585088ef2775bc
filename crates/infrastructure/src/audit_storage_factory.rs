use std::sync::Arc;

use tracing::info;
use vigil_application::{AuditConfig, AuditLogger, AuditStorage, CounterSink, StorageConfig};
use vigil_core::AppResult;

use crate::{AesFieldEncryptor, FileAuditStorage, InMemoryAuditStorage};

/// Builds the storage adapter selected by `config`.
#[must_use]
pub fn build_audit_storage(config: &StorageConfig) -> Arc<dyn AuditStorage> {
    match config {
        StorageConfig::Memory { max_events } => Arc::new(InMemoryAuditStorage::new(*max_events)),
        StorageConfig::File { path } => Arc::new(FileAuditStorage::new(path.clone())),
    }
}

/// Validates `config` and wires a ready-to-use audit logger.
///
/// Encryption is enabled only when key material is configured.
pub fn build_audit_logger(
    config: &AuditConfig,
    counters: Arc<dyn CounterSink>,
) -> AppResult<AuditLogger> {
    config.validate()?;

    let storage = build_audit_storage(&config.storage);
    let mut logger = AuditLogger::new(storage)
        .with_counter_sink(counters)
        .with_retention(config.retention);

    if let Some(key_material) = config.encryption_key.as_deref() {
        logger = logger.with_encryptor(Arc::new(AesFieldEncryptor::from_key_material(
            key_material,
        )?));
    }

    info!(
        backend = logger.backend_name(),
        encryption = config.encryption_key.is_some(),
        retention_days = config.retention.retention_days,
        "audit logger configured"
    );

    Ok(logger)
}
