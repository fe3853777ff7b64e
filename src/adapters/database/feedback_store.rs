use crate::adapters::database::DbPool;
use crate::adapters::database::feedback_repo::FeedbackRepository;
use crate::domain::{App, Feedback};
use crate::error::Result;
use crate::services::feedback::FeedbackStore;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Persists feedback into PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgFeedbackStore {
    pool: DbPool,
    repo: FeedbackRepository,
}

impl PgFeedbackStore {
    #[must_use]
    pub const fn new(pool: DbPool, repo: FeedbackRepository) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn save(&self, failed_at: OffsetDateTime, device_token: &str, app: &App) -> Result<Feedback> {
        let mut conn = self.pool.acquire().await?;
        self.repo.create(&mut conn, app.id, failed_at, device_token).await
    }
}
