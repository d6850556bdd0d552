//! Operator-facing HTTP endpoints for the staffetta relay
//!
//! This crate provides the health and queue-observability surface. Batch
//! processing failures never reach end users; these endpoints are where an
//! operator sees failure counts and configuration problems.
//!
//! # Endpoints
//!
//! - **`/health/live`** - Liveness probe: 200 while the process serves requests
//! - **`/health/ready`** - Readiness probe: 200 when every component is up and
//!   the backlog is below the configured ceiling
//! - **`/queue/health`** - Detailed queue health report (configuration,
//!   validation findings, warnings, counts)
//! - **`/queue/stats`** - Queue depth grouped by delivery status
//! - **`POST /queue/process`** - Run one processing pass now
//!
//! # Usage
//!
//! ```rust,no_run
//! use staffetta_health::{HealthChecker, HealthConfig, HealthServer};
//! use std::sync::Arc;
//!
//! # async fn example(service: Arc<dyn staffetta_delivery::QueueService>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = HealthConfig::default();
//! let checker = Arc::new(HealthChecker::new(config.max_queue_size));
//! let server = HealthServer::new(config, checker, service).await?;
//!
//! // Run the server
//! // server.serve(shutdown_receiver).await?;
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod error;
mod server;

pub use checker::{HealthChecker, HealthStatus};
pub use config::HealthConfig;
pub use error::HealthError;
pub use server::HealthServer;
