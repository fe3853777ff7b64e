pub mod callback;
pub mod connection;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use callback::{CallbackError, FeedbackCallback, FnCallback};
pub use connection::{Connection, ConnectionFactory, TransportError};
pub use store::FeedbackStore;

use crate::domain::Feedback;

/// Events published to in-process observers while feedback is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    ApnsFeedback(Feedback),
}

impl FeedbackEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ApnsFeedback(_) => "apns_feedback",
        }
    }
}
