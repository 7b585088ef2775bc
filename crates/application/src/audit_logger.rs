//! Audit logger: builds, classifies, protects and persists audit events.
//!
//! Every public operation absorbs its own failures. Callers on a business
//! path never see an audit error; failures are logged through `tracing` and
//! forwarded to the optional [`AuditFailureSink`].

use std::fmt::Display;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use vigil_domain::{
    AuditAction, AuditDetails, AuditEvent, AuditOutcome, AuditQueryFilters, AuditStatistics,
    EncryptedPayload, EventDetails, Geolocation, RiskLevel, StatisticsTimeframe, classify,
    is_sensitive, sanitize,
};

use crate::{
    AuditFailure, AuditFailureKind, AuditFailureSink, AuditStorage, CounterSink, FieldEncryptor,
    NoopCounterSink, RequestContext, RetentionPolicy,
};


/// Optional inputs for [`AuditLogger::log_event`].
#[derive(Debug, Clone, Default)]
pub struct LogEventOptions {
    /// Request context of the call site.
    pub request: Option<RequestContext>,
    /// Acting user; overrides the user carried by `request`.
    pub user_id: Option<String>,
    /// Specific instance acted upon.
    pub resource_id: Option<String>,
    /// Payload to sanitize and, for sensitive actions, encrypt.
    pub details: Option<AuditDetails>,
    /// Explicit risk; classified from action and outcome when absent.
    pub risk_level: Option<RiskLevel>,
    /// Upstream-supplied location.
    pub geolocation: Option<Geolocation>,
}

impl LogEventOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the request context.
    #[must_use]
    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = Some(request);
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the resource instance.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets the details payload.
    #[must_use]
    pub fn with_details(mut self, details: AuditDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets an explicit risk level.
    #[must_use]
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn with_geolocation(mut self, geolocation: Geolocation) -> Self {
        self.geolocation = Some(geolocation);
        self
    }
}

/// Application service orchestrating the audit pipeline.
#[derive(Clone)]
pub struct AuditLogger {
    storage: Arc<dyn AuditStorage>,
    encryptor: Option<Arc<dyn FieldEncryptor>>,
    counters: Arc<dyn CounterSink>,
    failure_sink: Option<Arc<dyn AuditFailureSink>>,
    retention: RetentionPolicy,
}

impl AuditLogger {
    /// Creates a logger writing to `storage` with no encryption.
    #[must_use]
    pub fn new(storage: Arc<dyn AuditStorage>) -> Self {
        Self {
            storage,
            encryptor: None,
            counters: Arc::new(NoopCounterSink),
            failure_sink: None,
            retention: RetentionPolicy::default(),
        }
    }

    /// Enables encryption of sensitive details.
    #[must_use]
    pub fn with_encryptor(mut self, encryptor: Arc<dyn FieldEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    /// Routes counter increments to `counters`.
    #[must_use]
    pub fn with_counter_sink(mut self, counters: Arc<dyn CounterSink>) -> Self {
        self.counters = counters;
        self
    }

    /// Forwards suppressed failures to `failure_sink`.
    #[must_use]
    pub fn with_failure_sink(mut self, failure_sink: Arc<dyn AuditFailureSink>) -> Self {
        self.failure_sink = Some(failure_sink);
        self
    }

    /// Overrides the retention policy.
    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Returns the retention policy used by sweeps.
    #[must_use]
    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Returns the active backend label.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }

    /// Records one event.
    ///
    /// Returns the event as persisted, or `None` when persistence failed. The
    /// failure has already been logged and reported at that point.
    pub async fn log_event(
        &self,
        action: AuditAction,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> Option<AuditEvent> {
        let event = self.build_event(action, resource, outcome, options);

        if let Err(error) = self.storage.store(event.clone()).await {
            self.report(AuditFailureKind::Store, error);
            return None;
        }

        self.emit_counters(&event);

        if event.risk_level.is_alerting() {
            warn!(
                target: "audit",
                event_id = %event.id,
                action = %event.action,
                outcome = %event.outcome,
                risk_level = %event.risk_level,
                user_id = event.user_id.as_deref().unwrap_or("-"),
                resource = %event.resource,
                ip_address = event.ip_address.as_deref().unwrap_or("-"),
                "high risk audit event"
            );
        } else {
            debug!(
                event_id = %event.id,
                action = %event.action,
                outcome = %event.outcome,
                "audit event stored"
            );
        }

        Some(event)
    }

    /// Returns matching events with sensitive details decrypted where possible.
    ///
    /// A backend failure yields an empty list.
    pub async fn query_events(&self, filters: &AuditQueryFilters) -> Vec<AuditEvent> {
        let events = match self.storage.query(filters).await {
            Ok(events) => events,
            Err(error) => {
                self.report(AuditFailureKind::Query, error);
                return Vec::new();
            }
        };

        if self.encryptor.is_none() {
            return events;
        }

        events
            .into_iter()
            .map(|mut event| {
                if let Some(EventDetails::Encrypted(payload)) = &event.details {
                    event.details = Some(self.open_details(payload));
                }
                event
            })
            .collect()
    }

    /// Decrypts an envelope, or returns it unchanged when that fails.
    ///
    /// Tampered tags, wrong keys and malformed hex all end up here as a
    /// reported `decryption-failure`; the caller sees the envelope and can
    /// detect the degraded state.
    #[must_use]
    pub fn open_details(&self, payload: &EncryptedPayload) -> EventDetails {
        let Some(encryptor) = &self.encryptor else {
            return EventDetails::Encrypted(payload.clone());
        };

        match encryptor.decrypt(payload) {
            Ok(details) => EventDetails::Plain(details),
            Err(error) => {
                self.report(AuditFailureKind::Decryption, error);
                EventDetails::Encrypted(payload.clone())
            }
        }
    }

    /// Aggregates events in the window ending now.
    ///
    /// A backend failure yields empty statistics.
    pub async fn get_statistics(&self, timeframe: StatisticsTimeframe) -> AuditStatistics {
        let (start_date, end_date) = timeframe.window_ending_at(Utc::now());
        let filters = AuditQueryFilters {
            start_date: Some(start_date),
            end_date: Some(end_date),
            limit: Some(usize::MAX),
            ..AuditQueryFilters::default()
        };

        match self.storage.query(&filters).await {
            Ok(events) => AuditStatistics::from_events(&events),
            Err(error) => {
                self.report(AuditFailureKind::Statistics, error);
                AuditStatistics::default()
            }
        }
    }

    /// Runs one retention sweep.
    ///
    /// Returns the number of removed events, or `None` when cleanup failed.
    pub async fn cleanup_now(&self) -> Option<u64> {
        match self.storage.cleanup(self.retention.retention_days).await {
            Ok(removed) => {
                if removed > 0 {
                    info!(
                        backend = self.storage.backend_name(),
                        removed,
                        retention_days = self.retention.retention_days,
                        "removed expired audit events"
                    );
                }
                Some(removed)
            }
            Err(error) => {
                self.report(AuditFailureKind::Cleanup, error);
                None
            }
        }
    }

    fn build_event(
        &self,
        action: AuditAction,
        resource: &str,
        outcome: AuditOutcome,
        options: LogEventOptions,
    ) -> AuditEvent {
        let LogEventOptions {
            request,
            user_id,
            resource_id,
            details,
            risk_level,
            geolocation,
        } = options;

        let mut event = AuditEvent::new(
            action,
            resource,
            outcome,
            risk_level.unwrap_or_else(|| classify(action, outcome)),
        );
        event.resource_id = resource_id;
        event.geolocation = geolocation;
        event.details = details.and_then(|details| self.protect_details(action, sanitize(&details)));
        event.user_id = user_id;

        if let Some(request) = request {
            event.ip_address = Some(request.client_ip());
            event.user_agent = request.user_agent();
            event.correlation_id = request.correlation_id();
            event.session_id = request.session_id;
            if event.user_id.is_none() {
                event.user_id = request.user_id;
            }
        }

        event
    }

    fn protect_details(&self, action: AuditAction, details: AuditDetails) -> Option<EventDetails> {
        let encryptor = match &self.encryptor {
            Some(encryptor) if is_sensitive(action) => encryptor,
            _ => return Some(EventDetails::Plain(details)),
        };

        match encryptor.encrypt(&details) {
            Ok(payload) => Some(EventDetails::Encrypted(payload)),
            Err(error) => {
                // sensitive details are dropped rather than stored in the clear
                self.report(AuditFailureKind::Encryption, error);
                None
            }
        }
    }

    fn emit_counters(&self, event: &AuditEvent) {
        self.counters
            .increment(format!("audit_{}", event.action.as_str()).as_str());
        self.counters
            .increment(format!("audit_outcome_{}", event.outcome.as_str()).as_str());
        self.counters
            .increment(format!("audit_risk_{}", event.risk_level.as_str()).as_str());
    }

    fn report(&self, kind: AuditFailureKind, error: impl Display) {
        let message = error.to_string();
        match kind {
            AuditFailureKind::Store | AuditFailureKind::Cleanup => error!(
                condition = kind.as_str(),
                backend = self.storage.backend_name(),
                error = %message,
                "audit pipeline failure suppressed"
            ),
            _ => warn!(
                condition = kind.as_str(),
                backend = self.storage.backend_name(),
                error = %message,
                "audit pipeline failure suppressed"
            ),
        }

        if let Some(sink) = &self.failure_sink {
            sink.record(AuditFailure { kind, message });
        }
    }
}
