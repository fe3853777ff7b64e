use crate::workers::feedback_receiver::FeedbackReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    Stopped,
}

/// Owns the background task that drives a `FeedbackReceiver`.
///
/// A poller runs at most once: `Idle -> Running -> Stopped`, and a stopped poller cannot be
/// restarted.
#[derive(Debug)]
pub struct FeedbackPoller {
    receiver: Option<FeedbackReceiver>,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    state: PollerState,
}

impl FeedbackPoller {
    #[must_use]
    pub fn new(receiver: FeedbackReceiver) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { receiver: Some(receiver), shutdown_tx, handle: None, state: PollerState::Idle }
    }

    #[must_use]
    pub const fn state(&self) -> PollerState {
        self.state
    }

    /// Spawns the polling task. Does nothing unless the poller is idle.
    pub fn start(&mut self) {
        if self.state != PollerState::Idle {
            return;
        }
        let Some(receiver) = self.receiver.take() else {
            return;
        };

        let span = tracing::info_span!("feedback_poller", app = %receiver.app().name);
        let shutdown_rx = self.shutdown_tx.subscribe();
        self.handle = Some(tokio::spawn(receiver.run(shutdown_rx).instrument(span)));
        self.state = PollerState::Running;
    }

    /// Signals the polling task to stop and wakes it if it is sleeping. Returns without waiting
    /// for a poll in progress; use `join` for that.
    pub fn stop(&mut self) {
        self.shutdown_tx.send_replace(true);
        self.receiver = None;
        self.state = PollerState::Stopped;
    }

    /// Waits for the polling task to exit.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Feedback poller task failed");
            }
        }
    }
}
