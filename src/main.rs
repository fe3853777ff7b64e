#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use apns_feedback::adapters::apns::TlsConnectionFactory;
use apns_feedback::adapters::database::{self, AppRepository, FeedbackRepository, PgFeedbackStore};
use apns_feedback::config::Config;
use apns_feedback::services::feedback::{ConnectionFactory, FeedbackStore};
use apns_feedback::{telemetry, workers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    apns_feedback::setup_panic_hook();

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    apns_feedback::spawn_signal_handler(shutdown_tx);

    let boot_span = tracing::info_span!("boot_daemon");
    let mut pollers = async {
        let pool = database::init_pool(&config.database).await?;
        apns_feedback::run_migrations(&pool).await?;

        let apps = {
            let mut conn = pool.acquire().await?;
            AppRepository::new().find_all(&mut conn).await?
        };
        if apps.is_empty() {
            tracing::warn!("No apps registered, nothing to poll");
        }

        let connections: Arc<dyn ConnectionFactory> = Arc::new(TlsConnectionFactory::from_config(&config.feedback)?);
        let store: Arc<dyn FeedbackStore> = Arc::new(PgFeedbackStore::new(pool, FeedbackRepository::new()));
        let (events, _) = broadcast::channel(config.feedback.event_capacity.max(1));

        Ok::<_, anyhow::Error>(workers::build_pollers(apps, &config.feedback, &connections, &store, &events, None))
    }
    .instrument(boot_span)
    .await?;

    for poller in &mut pollers {
        poller.start();
    }
    tracing::info!(pollers = pollers.len(), "Feedback daemon started");

    let _ = shutdown_rx.wait_for(|&stopped| stopped).await;

    for poller in &mut pollers {
        poller.stop();
    }

    tokio::select! {
        () = async {
            futures::future::join_all(pollers.iter_mut().map(|poller| poller.join())).await;
        } => {
            tracing::info!("Feedback pollers finished.");
        }
        () = tokio::time::sleep(Duration::from_secs(config.server.shutdown_timeout_secs)) => {
            tracing::warn!("Timeout waiting for feedback pollers to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
