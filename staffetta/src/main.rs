mod config;

use std::{sync::Arc, time::Duration};

use staffetta_common::Signal;
use staffetta_delivery::{HttpApiTransport, Processor, QueueService};
use staffetta_health::{HealthChecker, HealthServer};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    staffetta_common::logging::init();

    let config = Config::load()?;

    let store = config.store.clone().into_store()?;
    let transport = Arc::new(HttpApiTransport::new(&config.transport)?);
    let processor = Processor::new(
        config.processor.clone(),
        config.transport.clone(),
        store,
        transport,
    );

    let checker = Arc::new(HealthChecker::new(config.health.max_queue_size));
    checker.set_store_ready(true);
    // An incomplete credential set is reported through the health surface
    // rather than crashing the process; nothing sends until it is fixed
    checker.set_transport_ready(processor.validate_configuration().is_ok());

    let (shutdown_tx, _) = broadcast::channel::<Signal>(16);

    let health_handle = if config.health.enabled {
        let service: Arc<dyn QueueService> = Arc::new(processor.clone());
        let server =
            HealthServer::new(config.health.clone(), checker.clone(), service).await?;
        let shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move { server.serve(shutdown).await }))
    } else {
        None
    };

    let processor_handle = {
        let processor = processor.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { processor.serve(shutdown).await })
    };
    checker.set_processor_ready(true);

    // Keep the readiness backlog gauge current
    let gauge_handle = {
        let processor = processor.clone();
        let checker = checker.clone();
        let mut shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(Duration::from_secs(30));
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        match processor.stats().await {
                            Ok(counts) => checker.set_queue_size(counts.pending),
                            Err(e) => warn!(error = %e, "Failed to refresh queue gauge"),
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    };

    info!("staffetta running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    let _ = shutdown_tx.send(Signal::Shutdown);

    processor_handle.await??;
    if let Some(handle) = health_handle {
        handle.await??;
    }
    gauge_handle.await?;

    info!("Shutdown complete");
    Ok(())
}
