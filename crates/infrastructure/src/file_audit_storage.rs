use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;
use vigil_application::AuditStorage;
use vigil_core::{AppError, AppResult};
use vigil_domain::{AuditEvent, AuditQueryFilters, retention_cutoff};

/// Append-only JSON-lines audit store.
///
/// Every query and cleanup scans the whole file.
#[derive(Debug)]
pub struct FileAuditStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileAuditStorage {
    /// Creates a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn read_contents(&self) -> AppResult<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(error) => Err(AppError::Storage(format!(
                "failed to read audit log '{}': {error}",
                self.path.display()
            ))),
        }
    }
}

fn parse_lines(contents: &str) -> (Vec<AuditEvent>, usize) {
    let mut events = Vec::new();
    let mut malformed = 0_usize;

    for line in contents.lines().filter(|line| !line.trim().is_empty()) {
        match serde_json::from_str::<AuditEvent>(line) {
            Ok(event) => events.push(event),
            Err(_) => malformed += 1,
        }
    }

    (events, malformed)
}

#[async_trait]
impl AuditStorage for FileAuditStorage {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn store(&self, event: AuditEvent) -> AppResult<()> {
        let mut line = serde_json::to_string(&event)
            .map_err(|error| AppError::Internal(format!("failed to serialize audit event: {error}")))?;
        line.push('\n');

        let _guard = self.lock.write().await;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Storage(format!(
                    "failed to create audit log directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to open audit log '{}': {error}",
                    self.path.display()
                ))
            })?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|error| AppError::Storage(format!("failed to append audit event: {error}")))?;
        file.flush()
            .await
            .map_err(|error| AppError::Storage(format!("failed to flush audit log: {error}")))?;

        Ok(())
    }

    async fn query(&self, filters: &AuditQueryFilters) -> AppResult<Vec<AuditEvent>> {
        let contents = {
            let _guard = self.lock.read().await;
            self.read_contents().await?
        };

        let (events, malformed) = parse_lines(contents.as_str());
        if malformed > 0 {
            warn!(
                path = %self.path.display(),
                skipped_lines = malformed,
                "skipped unparsable audit log lines"
            );
        }

        Ok(filters.select(events))
    }

    async fn cleanup(&self, retention_days: u32) -> AppResult<u64> {
        let cutoff = retention_cutoff(Utc::now(), retention_days)?;
        let _guard = self.lock.write().await;
        let contents = self.read_contents().await?;

        let mut kept = String::with_capacity(contents.len());
        let mut removed = 0_u64;
        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            // unparsable lines are kept
            let expired = serde_json::from_str::<AuditEvent>(line)
                .map(|event| event.timestamp < cutoff)
                .unwrap_or(false);
            if expired {
                removed += 1;
            } else {
                kept.push_str(line);
                kept.push('\n');
            }
        }

        if removed == 0 {
            return Ok(0);
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, kept.as_bytes())
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to write audit log rewrite '{}': {error}",
                    temp_path.display()
                ))
            })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to replace audit log '{}': {error}",
                    self.path.display()
                ))
            })?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use vigil_application::AuditStorage;
    use vigil_core::{AppError, AppResult};
    use vigil_domain::{AuditAction, AuditEvent, AuditOutcome, AuditQueryFilters, RiskLevel};

    use super::FileAuditStorage;

    fn temp_log(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("vigil-{name}-{}", uuid::Uuid::new_v4()))
            .join("audit.log")
    }

    async fn remove(path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::remove_dir_all(parent).await;
        }
    }

    fn event(action: AuditAction, user_id: &str) -> AuditEvent {
        let mut event = AuditEvent::new(action, "run", AuditOutcome::Success, RiskLevel::Low);
        event.user_id = Some(user_id.to_owned());
        event
    }

    fn all() -> AuditQueryFilters {
        AuditQueryFilters {
            limit: Some(usize::MAX),
            ..AuditQueryFilters::default()
        }
    }

    #[tokio::test]
    async fn appends_one_json_line_per_event_and_creates_parent_dirs() -> AppResult<()> {
        let path = temp_log("append");
        let storage = FileAuditStorage::new(path.clone());

        storage.store(event(AuditAction::DataCreate, "u1")).await?;
        storage.store(event(AuditAction::DataUpdate, "u2")).await?;

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"action\":\"data.create\""));
        assert!(lines[1].contains("\"userId\":\"u2\""));

        remove(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_queries_as_empty() -> AppResult<()> {
        let storage = FileAuditStorage::new(temp_log("missing"));
        assert!(storage.query(&all()).await?.is_empty());
        assert_eq!(storage.cleanup(30).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn query_filters_and_skips_malformed_lines() -> AppResult<()> {
        let path = temp_log("malformed");
        let storage = FileAuditStorage::new(path.clone());
        storage.store(event(AuditAction::AuthLogin, "u1")).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        tokio::io::AsyncWriteExt::write_all(&mut file, b"{not json\n")
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        drop(file);

        storage.store(event(AuditAction::AuthLogout, "u1")).await?;
        storage.store(event(AuditAction::AuthLogin, "u2")).await?;

        let logins = storage
            .query(&AuditQueryFilters {
                action: Some(AuditAction::AuthLogin),
                ..all()
            })
            .await?;
        assert_eq!(logins.len(), 2);
        assert_eq!(logins[0].user_id.as_deref(), Some("u2"));
        assert_eq!(storage.query(&all()).await?.len(), 3);

        remove(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_rewrites_file_and_keeps_unparsable_lines() -> AppResult<()> {
        let path = temp_log("cleanup");
        let storage = FileAuditStorage::new(path.clone());

        let mut expired = event(AuditAction::DataRead, "old");
        expired.timestamp = Utc::now() - Duration::days(45);
        storage.store(expired).await?;
        storage.store(event(AuditAction::DataRead, "new")).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        tokio::io::AsyncWriteExt::write_all(&mut file, b"garbage\n")
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        drop(file);

        assert_eq!(storage.cleanup(30).await?, 1);

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("garbage"));
        assert!(!contents.contains("\"userId\":\"old\""));

        let remaining = storage.query(&all()).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id.as_deref(), Some("new"));

        remove(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn out_of_range_retention_is_rejected_without_rewriting() -> AppResult<()> {
        let path = temp_log("overflow");
        let storage = FileAuditStorage::new(path.clone());
        let mut expired = event(AuditAction::DataRead, "old");
        expired.timestamp = Utc::now() - Duration::days(400);
        storage.store(expired).await?;

        assert!(matches!(
            storage.cleanup(200_000_000).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(storage.query(&all()).await?.len(), 1);

        remove(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_racing_stores_loses_and_tears_no_lines() -> AppResult<()> {
        let path = temp_log("race");
        let storage = Arc::new(FileAuditStorage::new(path.clone()));
        for index in 0..20 {
            let mut expired = event(AuditAction::DataRead, format!("old-{index}").as_str());
            expired.timestamp = Utc::now() - Duration::days(90);
            storage.store(expired).await?;
        }

        let mut stores = Vec::new();
        for index in 0..40 {
            let storage = storage.clone();
            stores.push(tokio::spawn(async move {
                storage
                    .store(event(AuditAction::DataCreate, format!("new-{index}").as_str()))
                    .await
            }));
        }
        let cleanup = {
            let storage = storage.clone();
            tokio::spawn(async move { storage.cleanup(30).await })
        };

        for task in stores {
            task.await
                .map_err(|error| AppError::Internal(format!("store task panicked: {error}")))??;
        }
        let removed = cleanup
            .await
            .map_err(|error| AppError::Internal(format!("cleanup task panicked: {error}")))??;
        assert_eq!(removed, 20);

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let mut fresh = 0;
        for line in contents.lines() {
            let parsed = serde_json::from_str::<AuditEvent>(line)
                .map_err(|error| AppError::Internal(format!("torn line '{line}': {error}")))?;
            assert!(parsed.user_id.as_deref().is_some_and(|user| user.starts_with("new-")));
            fresh += 1;
        }
        assert_eq!(fresh, 40);

        remove(&path).await;
        Ok(())
    }

    // No index: a narrow query still parses every line in the file.
    #[tokio::test]
    async fn narrow_query_scans_the_whole_file() -> AppResult<()> {
        let path = temp_log("scan");
        let storage = FileAuditStorage::new(path.clone());

        storage.store(event(AuditAction::AuthLogin, "needle")).await?;
        for index in 0..200 {
            storage
                .store(event(AuditAction::DataRead, format!("hay-{index}").as_str()))
                .await?;
        }

        let found = storage
            .query(&AuditQueryFilters {
                user_id: Some("needle".to_owned()),
                limit: Some(1),
                ..AuditQueryFilters::default()
            })
            .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].action, AuditAction::AuthLogin);

        remove(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_appends_produce_whole_lines() -> AppResult<()> {
        let path = temp_log("concurrent");
        let storage = Arc::new(FileAuditStorage::new(path.clone()));

        let mut tasks = Vec::new();
        for index in 0..32 {
            let storage = storage.clone();
            tasks.push(tokio::spawn(async move {
                storage
                    .store(event(AuditAction::DataCreate, format!("user-{index}").as_str()))
                    .await
            }));
        }
        for task in tasks {
            task.await
                .map_err(|error| AppError::Internal(format!("store task panicked: {error}")))??;
        }

        assert_eq!(storage.query(&all()).await?.len(), 32);

        remove(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn encrypted_details_survive_the_file_roundtrip() -> AppResult<()> {
        let path = temp_log("envelope");
        let storage = FileAuditStorage::new(path.clone());

        let mut sealed = event(AuditAction::AuthLogin, "u1");
        sealed.details = Some(
            vigil_domain::EncryptedPayload::new("aa".to_owned(), "bb".to_owned(), "cc".to_owned())
                .into(),
        );
        storage.store(sealed).await?;

        let stored = storage.query(&all()).await?;
        assert_eq!(stored.len(), 1);
        assert!(stored[0].has_encrypted_details());

        remove(&path).await;
        Ok(())
    }
}
