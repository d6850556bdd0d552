//! Operator HTTP server

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use staffetta_common::Signal;
use staffetta_delivery::{ConfigurationError, QueueService};
use staffetta_store::StatusCounts;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::{HealthChecker, HealthConfig, HealthError};

/// Shared handler state
#[derive(Clone)]
struct AppState {
    checker: Arc<HealthChecker>,
    service: Arc<dyn QueueService>,
}

/// Operator HTTP server
///
/// Serves liveness/readiness probes plus the queue health, stats, and
/// manual-process endpoints.
pub struct HealthServer {
    listener: TcpListener,
    router: Router,
}

impl std::fmt::Debug for HealthServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthServer")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl HealthServer {
    /// Create a new server bound to the configured address
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn new(
        config: HealthConfig,
        checker: Arc<HealthChecker>,
        service: Arc<dyn QueueService>,
    ) -> Result<Self, HealthError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|e| HealthError::BindError {
                address: config.listen_address.clone(),
                source: e,
            })?;

        tracing::info!(
            address = %config.listen_address,
            "Operator HTTP server bound successfully"
        );

        let state = AppState { checker, service };

        // Probes must answer fast; queue routes may run a full pass
        let probes = Router::new()
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(1)));

        let queue = Router::new()
            .route("/queue/health", get(queue_health_handler))
            .route("/queue/stats", get(stats_handler))
            .route("/queue/process", post(process_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(300)));

        let router = probes.merge(queue).with_state(state);

        Ok(Self { listener, router })
    }

    /// Run the server until a shutdown signal is received
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), HealthError> {
        tracing::info!("Operator HTTP server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Operator HTTP server received shutdown signal");
            })
            .await
            .map_err(|e| HealthError::ServerError(e.to_string()))?;

        tracing::info!("Operator HTTP server stopped");
        Ok(())
    }
}

/// Liveness probe handler
///
/// Returns 200 OK if the application is alive (can respond to requests).
async fn liveness_handler(State(state): State<AppState>) -> Response {
    if state.checker.is_alive() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
    }
}

/// Readiness probe handler
///
/// Returns 200 OK if the application is ready to accept traffic.
async fn readiness_handler(State(state): State<AppState>) -> Response {
    if state.checker.is_ready() {
        (StatusCode::OK, "OK").into_response()
    } else {
        let status = state.checker.get_status();
        tracing::warn!(
            store_ready = status.store_ready,
            processor_ready = status.processor_ready,
            transport_ready = status.transport_ready,
            queue_size = status.queue_size,
            max_queue_size = status.max_queue_size,
            "Readiness probe failed"
        );
        (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
    }
}

/// Overall verdict of the queue health report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ReportStatus {
    Healthy,
    Warning,
    Error,
}

/// Whether each required configuration field is present and well-formed
#[derive(Debug, Serialize)]
struct ConfigurationPresence {
    api_key: bool,
    sender_email: bool,
    operator_email: bool,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Detailed queue health report for operators
#[derive(Debug, Serialize)]
struct QueueHealthReport {
    status: ReportStatus,
    timestamp: String,
    configuration: ConfigurationPresence,
    validation: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_stats: Option<StatusCounts>,
}

/// Pending backlogs above this raise a warning in the health report
const HIGH_QUEUE_WARNING_THRESHOLD: u64 = 10;

async fn build_queue_health(service: &dyn QueueService) -> QueueHealthReport {
    let findings = service.configuration_errors();

    let configuration = ConfigurationPresence {
        api_key: !findings
            .iter()
            .any(|f| matches!(f, ConfigurationError::MissingApiKey)),
        sender_email: !findings.iter().any(|f| {
            matches!(
                f,
                ConfigurationError::MissingSenderAddress
                    | ConfigurationError::InvalidSenderAddress(_)
            )
        }),
        operator_email: !findings.iter().any(|f| {
            matches!(
                f,
                ConfigurationError::MissingOperatorAddress
                    | ConfigurationError::InvalidOperatorAddress(_)
            )
        }),
    };

    let mut errors: Vec<String> = findings.iter().map(ToString::to_string).collect();
    let mut warnings = Vec::new();

    let queue_stats = match service.stats().await {
        Ok(counts) => {
            if counts.failed > 0 {
                warnings.push(format!(
                    "{} notifications permanently failed",
                    counts.failed
                ));
            }
            if counts.pending > HIGH_QUEUE_WARNING_THRESHOLD {
                warnings.push(format!(
                    "{} notifications pending (high queue)",
                    counts.pending
                ));
            }
            Some(counts)
        }
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };

    let status = if !errors.is_empty() {
        ReportStatus::Error
    } else if !warnings.is_empty() {
        ReportStatus::Warning
    } else {
        ReportStatus::Healthy
    };

    QueueHealthReport {
        status,
        timestamp: chrono::Utc::now().to_rfc3339(),
        configuration,
        validation: ValidationReport { errors, warnings },
        queue_stats,
    }
}

/// Queue health report handler
///
/// Returns 200 for healthy/warning reports and 500 when configuration or
/// the store make sending impossible.
async fn queue_health_handler(State(state): State<AppState>) -> Response {
    let report = build_queue_health(state.service.as_ref()).await;

    let code = if report.status == ReportStatus::Error {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    (code, Json(report)).into_response()
}

/// Queue stats handler
async fn stats_handler(State(state): State<AppState>) -> Response {
    match state.service.stats().await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read queue stats");
            error_response(&e.to_string())
        }
    }
}

/// Manual process trigger handler
///
/// Runs one pass over due items and reports the summary.
async fn process_handler(State(state): State<AppState>) -> Response {
    match state.service.run_batch().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Queue processed",
                "sent": summary.sent,
                "failed": summary.failed,
                "pending": summary.pending,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Manual queue pass failed");
            error_response(&e.to_string())
        }
    }
}

fn error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use staffetta_delivery::{BatchSummary, DeliveryError};
    use staffetta_store::{QueueItemId, StoreError};

    use super::*;

    #[derive(Debug, Default)]
    struct StubService {
        counts: StatusCounts,
        findings: Vec<ConfigurationError>,
        stats_fail: bool,
    }

    #[async_trait]
    impl QueueService for StubService {
        async fn stats(&self) -> Result<StatusCounts, DeliveryError> {
            if self.stats_fail {
                Err(DeliveryError::Store(StoreError::NotFound(
                    QueueItemId::generate(),
                )))
            } else {
                Ok(self.counts)
            }
        }

        async fn run_batch(&self) -> Result<BatchSummary, DeliveryError> {
            if let Some(finding) = self.findings.first() {
                return Err(DeliveryError::Configuration(finding.clone()));
            }
            Ok(BatchSummary {
                sent: 2,
                failed: 0,
                pending: 1,
            })
        }

        fn configuration_errors(&self) -> Vec<ConfigurationError> {
            self.findings.clone()
        }
    }

    fn state_with(service: StubService, checker: HealthChecker) -> AppState {
        AppState {
            checker: Arc::new(checker),
            service: Arc::new(service),
        }
    }

    #[tokio::test]
    async fn liveness_probe_always_passes() {
        let state = state_with(StubService::default(), HealthChecker::new(100));
        let response = liveness_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_probe_fails_when_components_are_down() {
        let state = state_with(StubService::default(), HealthChecker::new(100));
        let response = readiness_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn readiness_probe_passes_when_all_ready() {
        let checker = HealthChecker::new(100);
        checker.set_store_ready(true);
        checker.set_processor_ready(true);
        checker.set_transport_ready(true);
        checker.set_queue_size(5);

        let state = state_with(StubService::default(), checker);
        let response = readiness_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn healthy_report_with_clean_configuration() {
        let service = StubService {
            counts: StatusCounts {
                pending: 2,
                sent: 10,
                failed: 0,
            },
            ..StubService::default()
        };

        let report = build_queue_health(&service).await;
        assert_eq!(report.status, ReportStatus::Healthy);
        assert!(report.configuration.api_key);
        assert!(report.validation.errors.is_empty());
        assert_eq!(report.queue_stats.unwrap().sent, 10);
    }

    #[tokio::test]
    async fn warnings_for_failures_and_backlog() {
        let service = StubService {
            counts: StatusCounts {
                pending: 25,
                sent: 0,
                failed: 3,
            },
            ..StubService::default()
        };

        let report = build_queue_health(&service).await;
        assert_eq!(report.status, ReportStatus::Warning);
        assert_eq!(
            report.validation.warnings,
            vec![
                "3 notifications permanently failed".to_string(),
                "25 notifications pending (high queue)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn configuration_findings_produce_an_error_report() {
        let service = StubService {
            findings: vec![
                ConfigurationError::MissingApiKey,
                ConfigurationError::InvalidSenderAddress("nope".to_string()),
            ],
            ..StubService::default()
        };

        let report = build_queue_health(&service).await;
        assert_eq!(report.status, ReportStatus::Error);
        assert!(!report.configuration.api_key);
        assert!(!report.configuration.sender_email);
        assert!(report.configuration.operator_email);
        assert_eq!(report.validation.errors.len(), 2);

        let state = state_with(service, HealthChecker::new(100));
        let response = queue_health_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn stats_failure_is_an_error_report() {
        let service = StubService {
            stats_fail: true,
            ..StubService::default()
        };

        let report = build_queue_health(&service).await;
        assert_eq!(report.status, ReportStatus::Error);
        assert!(report.queue_stats.is_none());
    }

    #[tokio::test]
    async fn stats_handler_returns_counts() {
        let state = state_with(
            StubService {
                counts: StatusCounts {
                    pending: 1,
                    sent: 2,
                    failed: 3,
                },
                ..StubService::default()
            },
            HealthChecker::new(100),
        );
        let response = stats_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn process_handler_reports_the_summary() {
        let state = state_with(StubService::default(), HealthChecker::new(100));
        let response = process_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn process_handler_surfaces_configuration_errors() {
        let state = state_with(
            StubService {
                findings: vec![ConfigurationError::MissingApiKey],
                ..StubService::default()
            },
            HealthChecker::new(100),
        );
        let response = process_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
