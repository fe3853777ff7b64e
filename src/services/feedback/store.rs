use crate::domain::{App, Feedback};
use crate::error::Result;
use async_trait::async_trait;
use time::OffsetDateTime;

#[async_trait]
pub trait FeedbackStore: Send + Sync + std::fmt::Debug {
    /// Persists a delivery failure for `app` and returns the stored record.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the write fails.
    async fn save(&self, failed_at: OffsetDateTime, device_token: &str, app: &App) -> Result<Feedback>;
}
