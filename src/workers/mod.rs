pub mod feedback_poller;
pub mod feedback_receiver;

pub use feedback_poller::{FeedbackPoller, PollerState};
pub use feedback_receiver::{CycleSummary, FeedbackReceiver};

use crate::config::FeedbackConfig;
use crate::domain::App;
use crate::services::feedback::{ConnectionFactory, FeedbackCallback, FeedbackEvent, FeedbackStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Builds one idle poller per app, all sharing the transport, store, event channel and callback.
#[must_use]
pub fn build_pollers(
    apps: Vec<App>,
    config: &FeedbackConfig,
    connections: &Arc<dyn ConnectionFactory>,
    store: &Arc<dyn FeedbackStore>,
    events: &broadcast::Sender<FeedbackEvent>,
    callback: Option<&Arc<dyn FeedbackCallback>>,
) -> Vec<FeedbackPoller> {
    let interval = Duration::from_secs(config.poll_interval_secs);

    apps.into_iter()
        .map(|app| {
            let mut receiver =
                FeedbackReceiver::new(app, interval, Arc::clone(connections), Arc::clone(store), events.clone());
            if let Some(callback) = callback {
                receiver = receiver.with_callback(Arc::clone(callback));
            }
            FeedbackPoller::new(receiver)
        })
        .collect()
}
