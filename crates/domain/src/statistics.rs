use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::AppError;

use crate::AuditEvent;

/// Number of entries kept in each top-N list.
pub const TOP_ENTRY_LIMIT: usize = 10;

/// Look-back window for aggregate statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsTimeframe {
    /// Last 60 minutes.
    Hour,
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
}

impl StatisticsTimeframe {
    /// Returns the window length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }

    /// Returns `(start, end)` for a window ending at `now`.
    #[must_use]
    pub fn window_ending_at(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.duration(), now)
    }
}

impl FromStr for StatisticsTimeframe {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(AppError::Validation(format!(
                "timeframe must be one of hour, day, week, month, got '{value}'"
            ))),
        }
    }
}

/// One row of a top-N list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopEntry {
    /// Counted key (user id or resource label).
    pub key: String,
    /// Number of events.
    pub count: u64,
}

/// Aggregates over the events of one time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatistics {
    /// Events in the window.
    pub total_events: u64,
    /// Counts keyed by action storage value.
    pub by_action: BTreeMap<String, u64>,
    /// Counts keyed by outcome storage value.
    pub by_outcome: BTreeMap<String, u64>,
    /// Counts keyed by risk level storage value.
    pub by_risk_level: BTreeMap<String, u64>,
    /// Most active users.
    pub top_users: Vec<TopEntry>,
    /// Most touched resources.
    pub top_resources: Vec<TopEntry>,
}

impl AuditStatistics {
    /// Aggregates a set of events in the order they are given.
    ///
    /// Top-N ties are broken by the order keys were first seen in `events`.
    #[must_use]
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a AuditEvent>) -> Self {
        let mut statistics = Self::default();
        let mut users = FirstSeenCounter::default();
        let mut resources = FirstSeenCounter::default();

        for event in events {
            statistics.total_events += 1;
            *statistics
                .by_action
                .entry(event.action.as_str().to_owned())
                .or_default() += 1;
            *statistics
                .by_outcome
                .entry(event.outcome.as_str().to_owned())
                .or_default() += 1;
            *statistics
                .by_risk_level
                .entry(event.risk_level.as_str().to_owned())
                .or_default() += 1;

            if let Some(user_id) = &event.user_id {
                users.add(user_id);
            }
            resources.add(&event.resource);
        }

        statistics.top_users = users.top(TOP_ENTRY_LIMIT);
        statistics.top_resources = resources.top(TOP_ENTRY_LIMIT);
        statistics
    }
}

#[derive(Default)]
struct FirstSeenCounter {
    positions: HashMap<String, usize>,
    entries: Vec<TopEntry>,
}

impl FirstSeenCounter {
    fn add(&mut self, key: &str) {
        match self.positions.get(key) {
            Some(position) => self.entries[*position].count += 1,
            None => {
                self.positions.insert(key.to_owned(), self.entries.len());
                self.entries.push(TopEntry {
                    key: key.to_owned(),
                    count: 1,
                });
            }
        }
    }

    fn top(mut self, limit: usize) -> Vec<TopEntry> {
        // stable: equal counts keep first-seen order
        self.entries.sort_by(|left, right| right.count.cmp(&left.count));
        self.entries.truncate(limit);
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditStatistics, StatisticsTimeframe, TOP_ENTRY_LIMIT};
    use crate::{AuditAction, AuditEvent, AuditOutcome, RiskLevel};

    fn event(user: &str, resource: &str) -> AuditEvent {
        let mut event = AuditEvent::new(
            AuditAction::DataRead,
            resource,
            AuditOutcome::Success,
            RiskLevel::Low,
        );
        event.user_id = Some(user.to_owned());
        event
    }

    #[test]
    fn counts_by_dimension() {
        let events = vec![event("alice", "run"), event("alice", "goal"), event("bob", "run")];
        let statistics = AuditStatistics::from_events(&events);

        assert_eq!(statistics.total_events, 3);
        assert_eq!(statistics.by_action.get("data.read"), Some(&3));
        assert_eq!(statistics.by_outcome.get("success"), Some(&3));
        assert_eq!(statistics.by_risk_level.get("low"), Some(&3));
        assert_eq!(statistics.top_users[0].key, "alice");
        assert_eq!(statistics.top_users[0].count, 2);
        assert_eq!(statistics.top_resources[0].key, "run");
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let events = vec![event("carol", "a"), event("alice", "b"), event("bob", "c")];
        let statistics = AuditStatistics::from_events(&events);
        let users: Vec<&str> = statistics
            .top_users
            .iter()
            .map(|entry| entry.key.as_str())
            .collect();
        assert_eq!(users, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn top_lists_are_truncated() {
        let events: Vec<AuditEvent> = (0..15)
            .map(|index| event(format!("user-{index}").as_str(), "run"))
            .collect();
        let statistics = AuditStatistics::from_events(&events);
        assert_eq!(statistics.top_users.len(), TOP_ENTRY_LIMIT);
        assert_eq!(statistics.top_resources.len(), 1);
    }

    #[test]
    fn events_without_user_are_not_ranked() {
        let mut anonymous = event("ignored", "run");
        anonymous.user_id = None;
        let statistics = AuditStatistics::from_events(std::slice::from_ref(&anonymous));
        assert!(statistics.top_users.is_empty());
        assert_eq!(statistics.total_events, 1);
    }

    #[test]
    fn timeframe_parses_and_sizes_window() {
        let parsed = "week".parse::<StatisticsTimeframe>();
        assert!(matches!(parsed, Ok(StatisticsTimeframe::Week)));
        assert!("year".parse::<StatisticsTimeframe>().is_err());
        assert_eq!(StatisticsTimeframe::Month.duration().num_days(), 30);
    }
}
