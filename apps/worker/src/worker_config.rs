use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vigil_application::{
    AuditConfig, DEFAULT_CLEANUP_INTERVAL_HOURS, DEFAULT_LOG_PATH, DEFAULT_MAX_EVENTS,
    DEFAULT_RETENTION_DAYS, RetentionPolicy, StorageConfig,
};
use vigil_core::{AppError, AppResult};

/// Loads the audit configuration from the process environment.
pub fn load_audit_config() -> AppResult<AuditConfig> {
    audit_config_from(|name| env::var(name).ok())
}

/// Loads the audit configuration through an arbitrary variable lookup.
pub fn audit_config_from(lookup: impl Fn(&str) -> Option<String>) -> AppResult<AuditConfig> {
    let storage = match lookup("AUDIT_STORAGE")
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "memory".to_owned())
        .as_str()
    {
        "memory" => StorageConfig::Memory {
            max_events: parse_var(&lookup, "AUDIT_MAX_EVENTS", DEFAULT_MAX_EVENTS)?,
        },
        "file" => StorageConfig::File {
            path: PathBuf::from(
                lookup("AUDIT_LOG_PATH")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_LOG_PATH.to_owned()),
            ),
        },
        other => {
            return Err(AppError::Validation(format!(
                "AUDIT_STORAGE must be either 'memory' or 'file', got '{other}'"
            )));
        }
    };

    let encryption_key = lookup("AUDIT_ENCRYPTION_KEY").filter(|value| !value.trim().is_empty());
    let retention_days = parse_var(&lookup, "AUDIT_RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?;
    let cleanup_interval_hours = parse_var(
        &lookup,
        "AUDIT_CLEANUP_INTERVAL_HOURS",
        DEFAULT_CLEANUP_INTERVAL_HOURS,
    )?;

    let config = AuditConfig {
        storage,
        encryption_key,
        retention: RetentionPolicy {
            retention_days,
            cleanup_interval: Duration::from_secs(cleanup_interval_hours.saturating_mul(60 * 60)),
        },
    };
    config.validate()?;

    Ok(config)
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
