//! mint_settlement - Asynchronous mint settlement service
//!
//! Accepts mint requests over HTTP, records them, and settles each one
//! through a queue-driven worker pool. Status is readable at any time
//! through a cursor-paginated API.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mint_settlement::api::{self, AppState};
use mint_settlement::config::{Config, LogFormat, StorageBackend};
use mint_settlement::db;
use mint_settlement::handlers::ProcessMintHandler;
use mint_settlement::jobs::{JobScheduler, JobSchedulerConfig, QueueWorker, WorkerConfig};
use mint_settlement::queue::{InMemoryWorkQueue, PgWorkQueue, QueuePolicy, SharedWorkQueue};
use mint_settlement::settlement::{SharedSettlementClient, SimulatedSettlement};
use mint_settlement::store::{InMemoryMintStore, PgMintStore, SharedMintStore};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mint_settlement=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Store and queue selected by configuration
struct Backends {
    store: SharedMintStore,
    queue: SharedWorkQueue,
    pool: Option<PgPool>,
}

async fn connect_backends(config: &Config) -> anyhow::Result<Backends> {
    let policy = QueuePolicy {
        visibility_timeout: config.queue_visibility_timeout,
        max_receive_count: config.queue_max_receive_count,
    };

    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, records are lost on restart");
            Ok(Backends {
                store: Arc::new(InMemoryMintStore::new()),
                queue: Arc::new(InMemoryWorkQueue::new(policy)),
                pool: None,
            })
        }
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;

            tracing::info!("Connecting to database...");
            let pool = db::connect(database_url, config.database_max_connections).await?;

            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            Ok(Backends {
                store: Arc::new(PgMintStore::new(pool.clone())),
                queue: Arc::new(PgWorkQueue::new(pool.clone(), policy)),
                pool: Some(pool),
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        environment = %config.environment,
        backend = ?config.storage_backend,
        "Starting mint settlement service"
    );

    let backends = connect_backends(&config).await?;

    let simulation = SimulatedSettlement::new(config.settlement_latency, config.settlement_failure_rate);
    tracing::info!(
        latency_ms = simulation.latency().as_millis() as u64,
        failure_rate = simulation.failure_rate(),
        "Using simulated settlement service"
    );
    let settlement: SharedSettlementClient = Arc::new(simulation);

    // A call outliving the visibility timeout would race its own redelivery
    let processor = Arc::new(
        ProcessMintHandler::new(backends.store.clone(), settlement)
            .with_settlement_timeout(config.queue_visibility_timeout),
    );

    // Background tasks observe shutdown between deliveries
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let workers = QueueWorker::with_config(
        backends.queue.clone(),
        processor,
        WorkerConfig {
            concurrency: config.worker_concurrency,
            poll_interval: config.worker_poll_interval,
        },
    )
    .start(shutdown_rx.clone());
    tracing::info!(slots = workers.len(), "Queue workers started");

    let scheduler = JobScheduler::with_config(
        backends.store.clone(),
        backends.queue.clone(),
        JobSchedulerConfig {
            stale_pending_after: config.stale_pending_after,
            ..JobSchedulerConfig::default()
        },
    )
    .start(shutdown_rx);

    let app = api::build_router(AppState::new(
        backends.store.clone(),
        backends.queue.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    let _ = shutdown_tx.send(true);

    for handle in workers {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Queue worker terminated abnormally");
        }
    }
    if let Err(e) = scheduler.await {
        tracing::error!(error = %e, "Job scheduler terminated abnormally");
    }

    if let Some(pool) = backends.pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
