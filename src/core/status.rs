//! Read-only status feed and the periodic health monitor that refreshes it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::core::gateway::ModelGateway;

pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No probe has completed yet.
    Unknown,
    Ok,
    InvalidCredential,
    Unreachable,
    Degraded,
    /// No credential, so no probe was sent.
    NotConfigured,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Ok => "ok",
            HealthStatus::InvalidCredential => "invalid credential",
            HealthStatus::Unreachable => "unreachable",
            HealthStatus::Degraded => "degraded",
            HealthStatus::NotConfigured => "not configured",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unknown,
    Online,
    Offline,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Unknown => "unknown",
            ConnectionState::Online => "online",
            ConnectionState::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Outcome of one health probe.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Round trip time, present whenever an HTTP response arrived.
    pub latency: Option<Duration>,
    pub connection: ConnectionState,
    /// Model the probe ran against.
    pub model: String,
}

impl HealthReport {
    pub fn not_configured(model: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::NotConfigured,
            latency: None,
            connection: ConnectionState::Unknown,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub connection: ConnectionState,
    pub current_model: String,
    pub last_latency: Option<Duration>,
    pub api_health: HealthStatus,
}

impl StatusSnapshot {
    pub fn new(current_model: impl Into<String>) -> Self {
        Self {
            connection: ConnectionState::Unknown,
            current_model: current_model.into(),
            last_latency: None,
            api_health: HealthStatus::Unknown,
        }
    }

    pub fn summary(&self) -> String {
        let latency = self
            .last_latency
            .map(|latency| format!("{} ms", latency.as_millis()))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "connection: {} | model: {} | latency: {} | api: {}",
            self.connection, self.current_model, latency, self.api_health
        )
    }
}

/// Publisher side of the status feed. Clones publish into the same channel.
#[derive(Clone)]
pub struct StatusFeed {
    sender: Arc<watch::Sender<StatusSnapshot>>,
}

impl StatusFeed {
    pub fn new(current_model: impl Into<String>) -> Self {
        let (sender, _) = watch::channel(StatusSnapshot::new(current_model));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.sender.borrow().clone()
    }

    pub fn set_model(&self, model: &str) {
        self.sender.send_if_modified(|snapshot| {
            if snapshot.current_model == model {
                return false;
            }
            snapshot.current_model = model.to_string();
            snapshot.last_latency = None;
            true
        });
    }

    pub fn record_connection(&self, connection: ConnectionState) {
        self.sender.send_if_modified(|snapshot| {
            let changed = snapshot.connection != connection;
            snapshot.connection = connection;
            changed
        });
    }

    /// Record the latency of a completed call against `model`.
    pub fn record_latency(&self, model: &str, latency: Duration) {
        self.sender.send_modify(|snapshot| {
            snapshot.connection = ConnectionState::Online;
            if snapshot.current_model == model {
                snapshot.last_latency = Some(latency);
            }
        });
    }

    pub fn record_health(&self, report: &HealthReport) {
        self.sender.send_modify(|snapshot| {
            snapshot.api_health = report.status;
            if report.connection != ConnectionState::Unknown {
                snapshot.connection = report.connection;
            }
            if let Some(latency) = report.latency {
                if snapshot.current_model == report.model {
                    snapshot.last_latency = Some(latency);
                }
            }
        });
    }
}

/// Background task probing the API on a fixed period.
///
/// The first probe runs one period after spawning. Dropping the monitor stops it.
pub struct HealthMonitor {
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn spawn(gateway: Arc<ModelGateway>, feed: StatusFeed, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = gateway.check_health().await;
                debug!(
                    status = %report.status,
                    latency_ms = report.latency.map(|l| l.as_millis() as u64),
                    model = %report.model,
                    "Health probe finished"
                );
                feed.record_health(&report);
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connectivity::FixedConnectivity;
    use crate::core::gateway::GatewaySettings;
    use crate::utils::test_utils::{test_http_client, MockResponse, MockServer};
    use serde_json::json;

    fn gateway(base_url: &str, credential: Option<&str>) -> Arc<ModelGateway> {
        let settings = GatewaySettings {
            base_url: base_url.to_string(),
            ..GatewaySettings::default()
        };
        Arc::new(ModelGateway::new(
            test_http_client(),
            settings,
            credential.map(str::to_string),
            Arc::new(FixedConnectivity(true)),
        ))
    }

    async fn next_health(
        receiver: &mut watch::Receiver<StatusSnapshot>,
        wanted: HealthStatus,
    ) -> StatusSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                receiver.changed().await.expect("feed open");
                let snapshot = receiver.borrow_and_update().clone();
                if snapshot.api_health == wanted {
                    return snapshot;
                }
            }
        })
        .await
        .expect("health status should be published")
    }

    #[test]
    fn latency_only_counts_for_current_model() {
        let feed = StatusFeed::new("grok-beta");
        feed.record_latency("grok-vision-beta", Duration::from_millis(80));
        assert_eq!(feed.snapshot().last_latency, None);
        assert_eq!(feed.snapshot().connection, ConnectionState::Online);

        feed.record_latency("grok-beta", Duration::from_millis(40));
        assert_eq!(feed.snapshot().last_latency, Some(Duration::from_millis(40)));

        feed.set_model("grok-2");
        assert_eq!(feed.snapshot().current_model, "grok-2");
        assert_eq!(feed.snapshot().last_latency, None);
    }

    #[test]
    fn health_report_updates_snapshot() {
        let feed = StatusFeed::new("grok-beta");
        let mut receiver = feed.subscribe();
        feed.record_health(&HealthReport {
            status: HealthStatus::Degraded,
            latency: Some(Duration::from_millis(12)),
            connection: ConnectionState::Online,
            model: "grok-beta".to_string(),
        });

        assert!(receiver.has_changed().expect("feed open"));
        let snapshot = receiver.borrow_and_update().clone();
        assert_eq!(snapshot.api_health, HealthStatus::Degraded);
        assert_eq!(snapshot.last_latency, Some(Duration::from_millis(12)));
        assert!(snapshot.summary().contains("api: degraded"));
    }

    #[tokio::test]
    async fn monitor_skips_network_without_credential() {
        let server = MockServer::start(vec![MockResponse::completion("")]).await;
        let feed = StatusFeed::new("grok-beta");
        let mut receiver = feed.subscribe();

        let monitor = HealthMonitor::spawn(
            gateway(&server.base_url, None),
            feed.clone(),
            Duration::from_millis(20),
        );
        let snapshot = next_health(&mut receiver, HealthStatus::NotConfigured).await;
        monitor.stop();

        assert_eq!(snapshot.last_latency, None);
        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn monitor_publishes_probe_results() {
        let server = MockServer::start(vec![MockResponse::json(
            200,
            json!({"choices": [{"message": {"content": "p"}}]}),
        )])
        .await;
        let feed = StatusFeed::new("grok-beta");
        let mut receiver = feed.subscribe();

        let monitor = HealthMonitor::spawn(
            gateway(&server.base_url, Some("xai-key")),
            feed.clone(),
            Duration::from_millis(20),
        );
        let snapshot = next_health(&mut receiver, HealthStatus::Ok).await;
        monitor.stop();

        assert_eq!(snapshot.connection, ConnectionState::Online);
        assert!(snapshot.last_latency.is_some());

        let requests = server.requests();
        let body = requests[0].json();
        assert_eq!(body["max_tokens"], 1);
        assert_eq!(body["messages"][0]["content"], "ping");
    }
}
