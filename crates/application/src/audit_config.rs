use std::path::PathBuf;
use std::time::Duration;

use vigil_core::{AppError, AppResult};

/// Default in-memory capacity.
pub const DEFAULT_MAX_EVENTS: usize = 10_000;
/// Default file backend path.
pub const DEFAULT_LOG_PATH: &str = "logs/audit.log";
/// Default retention window.
pub const DEFAULT_RETENTION_DAYS: u32 = 365;
/// Default sweep interval.
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 24;
/// Longest accepted retention window (100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Backend selection made at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Bounded in-process ring buffer.
    Memory {
        /// Maximum retained events before FIFO eviction.
        max_events: usize,
    },
    /// Append-only newline-delimited JSON file.
    File {
        /// Log file location.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory {
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

/// Retention window and sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Events older than this many days are removed.
    pub retention_days: u32,
    /// Delay between sweeps.
    pub cleanup_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_HOURS * 60 * 60),
        }
    }
}

/// Complete audit pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditConfig {
    /// Backend selection.
    pub storage: StorageConfig,
    /// Key material; `None` stores sanitized plaintext.
    pub encryption_key: Option<String>,
    /// Retention settings.
    pub retention: RetentionPolicy,
}

impl AuditConfig {
    /// Checks invariants the environment loader cannot express in types.
    pub fn validate(&self) -> AppResult<()> {
        if let StorageConfig::Memory { max_events: 0 } = self.storage {
            return Err(AppError::Validation(
                "AUDIT_MAX_EVENTS must be greater than zero".to_owned(),
            ));
        }

        if let StorageConfig::File { path } = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(AppError::Validation(
                    "AUDIT_LOG_PATH must not be empty".to_owned(),
                ));
            }
        }

        if self
            .encryption_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            return Err(AppError::Validation(
                "AUDIT_ENCRYPTION_KEY must not be empty when set".to_owned(),
            ));
        }

        if self.retention.retention_days == 0 {
            return Err(AppError::Validation(
                "AUDIT_RETENTION_DAYS must be greater than zero".to_owned(),
            ));
        }

        if self.retention.retention_days > MAX_RETENTION_DAYS {
            return Err(AppError::Validation(format!(
                "AUDIT_RETENTION_DAYS must be at most {MAX_RETENTION_DAYS}"
            )));
        }

        if self.retention.cleanup_interval.is_zero() {
            return Err(AppError::Validation(
                "AUDIT_CLEANUP_INTERVAL_HOURS must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{AuditConfig, MAX_RETENTION_DAYS, RetentionPolicy, StorageConfig};

    #[test]
    fn defaults_are_valid() {
        let config = AuditConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retention.retention_days, 365);
        assert_eq!(config.retention.cleanup_interval, Duration::from_secs(86_400));
    }

    #[test]
    fn zero_capacity_and_blank_key_are_rejected() {
        let config = AuditConfig {
            storage: StorageConfig::Memory { max_events: 0 },
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AuditConfig {
            encryption_key: Some("  ".to_owned()),
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AuditConfig {
            storage: StorageConfig::File {
                path: PathBuf::new(),
            },
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retention_is_rejected() {
        let config = AuditConfig {
            retention: RetentionPolicy {
                retention_days: 0,
                ..RetentionPolicy::default()
            },
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn retention_beyond_the_upper_bound_is_rejected() {
        let policy = |retention_days| AuditConfig {
            retention: RetentionPolicy {
                retention_days,
                ..RetentionPolicy::default()
            },
            ..AuditConfig::default()
        };

        assert!(policy(MAX_RETENTION_DAYS).validate().is_ok());
        assert!(policy(MAX_RETENTION_DAYS + 1).validate().is_err());
        assert!(policy(200_000_000).validate().is_err());
    }
}
