use crate::adapters::apns::codec::{self, TUPLE_LEN};
use crate::domain::App;
use crate::domain::feedback::format_utc;
use crate::services::feedback::callback::{invoke_isolated, panic_message};
use crate::services::feedback::{
    Connection, ConnectionFactory, FeedbackCallback, FeedbackEvent, FeedbackStore, TransportError,
};
use futures::FutureExt;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    received: Counter<u64>,
    cycle_errors: Counter<u64>,
    persist_errors: Counter<u64>,
    callback_errors: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("apns-feedback");
        Self {
            received: meter
                .u64_counter("apns_feedback_received_total")
                .with_description("Total number of feedback tuples received and persisted")
                .build(),
            cycle_errors: meter
                .u64_counter("apns_feedback_cycle_errors_total")
                .with_description("Total number of feedback polls that ended on a transport error")
                .build(),
            persist_errors: meter
                .u64_counter("apns_feedback_persist_errors_total")
                .with_description("Total number of feedback tuples that could not be persisted")
                .build(),
            callback_errors: meter
                .u64_counter("apns_feedback_callback_errors_total")
                .with_description("Total number of failed feedback callback invocations")
                .build(),
        }
    }
}

/// Outcome of a single feedback poll.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub received: usize,
    pub persist_failures: usize,
    pub callback_failures: usize,
    /// The poll ended early on a transport error.
    pub aborted: bool,
}

/// Polls the feedback service for one app and records every device it reports.
#[derive(Debug)]
pub struct FeedbackReceiver {
    app: App,
    poll_interval: Duration,
    connections: Arc<dyn ConnectionFactory>,
    store: Arc<dyn FeedbackStore>,
    events: broadcast::Sender<FeedbackEvent>,
    callback: Option<Arc<dyn FeedbackCallback>>,
    metrics: Metrics,
}

impl FeedbackReceiver {
    #[must_use]
    pub fn new(
        app: App,
        poll_interval: Duration,
        connections: Arc<dyn ConnectionFactory>,
        store: Arc<dyn FeedbackStore>,
        events: broadcast::Sender<FeedbackEvent>,
    ) -> Self {
        Self { app, poll_interval, connections, store, events, callback: None, metrics: Metrics::new() }
    }

    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn FeedbackCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    #[must_use]
    pub const fn app(&self) -> &App {
        &self.app
    }

    /// Polls, then sleeps for the poll interval, until `shutdown` flips to `true` or its sender
    /// goes away. A shutdown during the sleep wakes it immediately; a poll in progress is allowed
    /// to finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            app = %self.app.name,
            interval_secs = self.poll_interval.as_secs(),
            "Feedback receiver started"
        );

        while !*shutdown.borrow() {
            let cycle = self
                .check_for_feedback()
                .instrument(tracing::info_span!("feedback_iteration", app = %self.app.name));
            if let Err(payload) = AssertUnwindSafe(cycle).catch_unwind().await {
                tracing::error!(panic = %panic_message(payload.as_ref()), app = %self.app.name, "Feedback poll panicked");
                self.metrics.cycle_errors.add(1, &[]);
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                res = shutdown.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(app = %self.app.name, "Feedback receiver shutting down...");
    }

    /// Drains the feedback service once. Failures and panics are logged and reflected in the
    /// summary, never returned, and the connection is always closed.
    pub async fn check_for_feedback(&self) -> CycleSummary {
        let (host, port) = self.app.environment.feedback_endpoint();
        let mut connection = self.connections.connection(&self.app, host, port);
        let mut summary = CycleSummary::default();

        match AssertUnwindSafe(self.drain(connection.as_mut(), &mut summary)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %e, app = %self.app.name, "Feedback poll failed");
                self.metrics.cycle_errors.add(1, &[]);
                summary.aborted = true;
            }
            Err(payload) => {
                tracing::error!(panic = %panic_message(payload.as_ref()), app = %self.app.name, "Feedback poll panicked");
                self.metrics.cycle_errors.add(1, &[]);
                summary.aborted = true;
            }
        }

        if let Err(e) = connection.close().await {
            tracing::error!(error = %e, app = %self.app.name, "Failed to close feedback connection");
        }

        tracing::debug!(
            received = summary.received,
            persist_failures = summary.persist_failures,
            callback_failures = summary.callback_failures,
            "Feedback poll finished"
        );
        summary
    }

    async fn drain(&self, connection: &mut dyn Connection, summary: &mut CycleSummary) -> Result<(), TransportError> {
        connection.connect().await?;

        loop {
            let bytes = connection.read(TUPLE_LEN).await?;
            let Ok(tuple) = <[u8; TUPLE_LEN]>::try_from(bytes.as_slice()) else {
                if !bytes.is_empty() {
                    tracing::debug!(len = bytes.len(), "Discarding partial feedback tuple");
                }
                break;
            };
            self.process_tuple(&tuple, summary).await;
        }

        Ok(())
    }

    async fn process_tuple(&self, tuple: &[u8; TUPLE_LEN], summary: &mut CycleSummary) {
        let record = codec::decode(tuple);

        let feedback = match self.store.save(record.failed_at, &record.device_token, &self.app).await {
            Ok(feedback) => feedback,
            Err(e) => {
                tracing::error!(error = %e, device_token = %record.device_token, "Failed to persist feedback");
                self.metrics.persist_errors.add(1, &[]);
                summary.persist_failures += 1;
                return;
            }
        };

        summary.received += 1;
        self.metrics.received.add(1, &[KeyValue::new("environment", self.app.environment.to_string())]);

        tracing::info!(
            "[{}] [FeedbackReceiver] Delivery failed at {} for {}.",
            self.app.name,
            format_utc(record.failed_at),
            record.device_token
        );

        // Nobody listening is fine.
        let _ = self.events.send(FeedbackEvent::ApnsFeedback(feedback.clone()));

        if let Some(callback) = &self.callback {
            if let Err(e) = invoke_isolated(callback.as_ref(), &feedback).await {
                tracing::error!(error = %e, device_token = %feedback.device_token, "Feedback callback failed");
                self.metrics.callback_errors.add(1, &[]);
                summary.callback_failures += 1;
            }
        }
    }
}
