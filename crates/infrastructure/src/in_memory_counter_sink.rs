use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use vigil_application::CounterSink;

/// Process-local counter registry.
#[derive(Debug, Default)]
pub struct InMemoryCounterSink {
    counters: Mutex<BTreeMap<String, u64>>,
}

impl InMemoryCounterSink {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of one counter.
    #[must_use]
    pub fn get(&self, counter: &str) -> u64 {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(counter)
            .copied()
            .unwrap_or(0)
    }

    /// Returns every counter, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CounterSink for InMemoryCounterSink {
    fn increment(&self, counter: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let value = counters.entry(counter.to_owned()).or_insert(0);
        *value = value.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use vigil_application::CounterSink;

    use super::InMemoryCounterSink;

    #[test]
    fn increments_are_tracked_per_name() {
        let sink = InMemoryCounterSink::new();
        sink.increment("audit_auth.login");
        sink.increment("audit_auth.login");
        sink.increment("audit_outcome_failure");

        assert_eq!(sink.get("audit_auth.login"), 2);
        assert_eq!(sink.get("audit_outcome_failure"), 1);
        assert_eq!(sink.get("audit_risk_high"), 0);
        assert_eq!(sink.snapshot().len(), 2);
    }
}
