use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use vigil_application::AuditStorage;
use vigil_core::AppResult;
use vigil_domain::{AuditEvent, AuditQueryFilters, retention_cutoff};

/// Bounded in-process audit store. Not durable across restarts.
///
/// Once `max_events` is exceeded the oldest events are evicted first,
/// independent of the retention sweep.
#[derive(Debug)]
pub struct InMemoryAuditStorage {
    events: RwLock<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditStorage {
    /// Creates an empty store holding at most `max_events` events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            max_events: max_events.max(1),
        }
    }

    /// Returns the number of retained events.
    pub async fn retained_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl AuditStorage for InMemoryAuditStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn store(&self, event: AuditEvent) -> AppResult<()> {
        let mut events = self.events.write().await;
        events.push_back(event);

        let overflow = events.len().saturating_sub(self.max_events);
        if overflow > 0 {
            events.drain(..overflow);
            debug!(evicted = overflow, max_events = self.max_events, "evicted oldest audit events");
        }

        Ok(())
    }

    async fn query(&self, filters: &AuditQueryFilters) -> AppResult<Vec<AuditEvent>> {
        let events = self.events.read().await;
        Ok(filters.select(events.iter().cloned()))
    }

    async fn cleanup(&self, retention_days: u32) -> AppResult<u64> {
        let cutoff = retention_cutoff(Utc::now(), retention_days)?;
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|event| event.timestamp >= cutoff);

        Ok(u64::try_from(before - events.len()).unwrap_or(u64::MAX))
    }
}
