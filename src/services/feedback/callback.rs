use crate::domain::Feedback;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use thiserror::Error;

/// User hook invoked once for every persisted feedback record.
#[async_trait]
pub trait FeedbackCallback: Send + Sync + std::fmt::Debug {
    async fn on_feedback(&self, feedback: &Feedback) -> anyhow::Result<()>;
}

/// Adapts a plain closure into a `FeedbackCallback`.
pub struct FnCallback<F> {
    f: F,
}

impl<F> FnCallback<F>
where
    F: Fn(&Feedback) -> anyhow::Result<()> + Send + Sync,
{
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnCallback<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCallback").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> FeedbackCallback for FnCallback<F>
where
    F: Fn(&Feedback) -> anyhow::Result<()> + Send + Sync,
{
    async fn on_feedback(&self, feedback: &Feedback) -> anyhow::Result<()> {
        (self.f)(feedback)
    }
}

#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("Feedback callback failed: {0}")]
    Failed(anyhow::Error),
    #[error("Feedback callback panicked: {0}")]
    Panicked(String),
}

/// Runs `callback`, converting both returned errors and panics into a `CallbackError`.
///
/// # Errors
/// Returns `CallbackError` if the callback returns an error or panics.
pub async fn invoke_isolated(callback: &dyn FeedbackCallback, feedback: &Feedback) -> Result<(), CallbackError> {
    match AssertUnwindSafe(callback.on_feedback(feedback)).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CallbackError::Failed(e)),
        Err(payload) => Err(CallbackError::Panicked(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
