use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datapull_core::Settings;
use datapull_places::{ContactEnricher, LeadFetcher, NominatimGeocoder, PlacesClient};
use datapull_store::{Database, RedisStore};
use datapull_worker::{JobProcessor, Worker, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datapull_worker=debug,datapull_places=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    tracing::info!(
        "Starting DataPull worker with {} concurrent loops",
        settings.worker_concurrency
    );

    let redis = Arc::new(RedisStore::connect(&settings.redis_url()).await?);
    let database = Arc::new(Database::new(settings.require_database_url()?).await?);

    let places = Arc::new(PlacesClient::new(
        settings.require_google_maps_api_key()?.to_string(),
    ));
    let geocoder = Arc::new(NominatimGeocoder::new(settings.nominatim_url.clone())?);
    let processor = JobProcessor::new(
        LeadFetcher::new(places, geocoder),
        redis.clone(),
        database.clone(),
        database,
    )
    .with_enricher(ContactEnricher::new()?);
    let processor = Arc::new(processor);

    let config = WorkerConfig {
        job_timeout: Duration::from_secs(settings.job_timeout_secs),
        ..Default::default()
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut loops = Vec::with_capacity(settings.worker_concurrency);
    for _ in 0..settings.worker_concurrency {
        // BRPOP blocks its connection, so each loop pops on its own
        let queue = Arc::new(RedisStore::connect(&settings.redis_url()).await?);
        let worker = Worker::new(
            processor.clone(),
            queue,
            redis.clone(),
            config.clone(),
        );
        let shutdown = shutdown_rx.clone();
        loops.push(tokio::spawn(async move { worker.run(shutdown).await }));
    }

    shutdown_signal().await;
    shutdown_tx.send(true)?;

    for handle in loops {
        if let Err(e) = handle.await {
            tracing::error!("Worker loop panicked: {}", e);
        }
    }

    tracing::info!("Worker shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
