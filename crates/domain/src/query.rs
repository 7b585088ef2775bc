use chrono::{DateTime, TimeDelta, Utc};
use vigil_core::{AppError, AppResult};

use crate::{AuditAction, AuditEvent, AuditOutcome, RiskLevel};

/// Page size used when a query does not set `limit`.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Read-only criteria applied at query time. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQueryFilters {
    /// Acting user.
    pub user_id: Option<String>,
    /// Exact action.
    pub action: Option<AuditAction>,
    /// Exact resource label.
    pub resource: Option<String>,
    /// Exact outcome.
    pub outcome: Option<AuditOutcome>,
    /// Exact risk level.
    pub risk_level: Option<RiskLevel>,
    /// Inclusive lower bound on the event timestamp.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the event timestamp.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum events returned, defaults to [`DEFAULT_QUERY_LIMIT`].
    pub limit: Option<usize>,
    /// Events skipped after sorting.
    pub offset: Option<usize>,
}

/// Untyped query parameters as received from a transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAuditQuery {
    /// Acting user.
    pub user_id: Option<String>,
    /// Action storage value.
    pub action: Option<String>,
    /// Resource label.
    pub resource: Option<String>,
    /// Outcome storage value.
    pub outcome: Option<String>,
    /// Risk level storage value.
    pub risk_level: Option<String>,
    /// RFC 3339 lower bound.
    pub start_date: Option<String>,
    /// RFC 3339 upper bound.
    pub end_date: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Page offset.
    pub offset: Option<usize>,
}

impl AuditQueryFilters {
    /// Parses transport parameters, rejecting malformed values.
    pub fn from_raw(raw: RawAuditQuery) -> AppResult<Self> {
        let start_date = raw.start_date.as_deref().map(parse_date).transpose()?;
        let end_date = raw.end_date.as_deref().map(parse_date).transpose()?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::Validation(
                    "startDate must not be after endDate".to_owned(),
                ));
            }
        }

        Ok(Self {
            user_id: raw.user_id,
            action: raw.action.as_deref().map(str::parse).transpose()?,
            resource: raw.resource,
            outcome: raw.outcome.as_deref().map(str::parse).transpose()?,
            risk_level: raw.risk_level.as_deref().map(str::parse).transpose()?,
            start_date,
            end_date,
            limit: raw.limit,
            offset: raw.offset,
        })
    }

    /// Returns the effective page size.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_QUERY_LIMIT)
    }

    /// Returns whether one event satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(user_id) = &self.user_id {
            if event.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }
        if self.action.is_some_and(|action| action != event.action) {
            return false;
        }
        if let Some(resource) = &self.resource {
            if &event.resource != resource {
                return false;
            }
        }
        if self.outcome.is_some_and(|outcome| outcome != event.outcome) {
            return false;
        }
        if self.risk_level.is_some_and(|level| level != event.risk_level) {
            return false;
        }
        if self.start_date.is_some_and(|start| event.timestamp < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| event.timestamp > end) {
            return false;
        }

        true
    }

    /// Filters, sorts newest first and paginates a candidate set.
    ///
    /// The sort is stable, so events sharing a timestamp keep their relative
    /// order from `events` reversed (later insertions first).
    #[must_use]
    pub fn select(&self, events: impl IntoIterator<Item = AuditEvent>) -> Vec<AuditEvent> {
        let mut matched: Vec<AuditEvent> = events
            .into_iter()
            .filter(|event| self.matches(event))
            .collect();
        matched.reverse();
        matched.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));

        matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.effective_limit())
            .collect()
    }
}

/// Returns the instant before which events fall outside the retention window.
///
/// Windows reaching past the representable date range are rejected.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> AppResult<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(retention_days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "retention window of {retention_days} days is out of range"
            ))
        })
}

fn parse_date(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid date '{value}': {error}")))
}
