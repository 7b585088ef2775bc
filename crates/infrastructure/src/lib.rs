//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_field_encryptor;
mod audit_storage_factory;
mod file_audit_storage;
mod in_memory_audit_storage;
mod in_memory_counter_sink;

pub use aes_field_encryptor::AesFieldEncryptor;
pub use audit_storage_factory::{build_audit_logger, build_audit_storage};
pub use file_audit_storage::FileAuditStorage;
pub use in_memory_audit_storage::InMemoryAuditStorage;
pub use in_memory_counter_sink::InMemoryCounterSink;
