use crate::adapters::database::records::StoredFeedbackRecord;
use crate::domain::Feedback;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct FeedbackRepository {}

impl FeedbackRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Records a delivery failure reported by the feedback service.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, device_token), err)]
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        app_id: Uuid,
        failed_at: OffsetDateTime,
        device_token: &str,
    ) -> Result<Feedback> {
        let record = sqlx::query_as::<_, StoredFeedbackRecord>(
            r#"
            INSERT INTO feedback (id, app_id, device_token, failed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, app_id, device_token, failed_at, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(app_id)
        .bind(device_token)
        .bind(failed_at)
        .fetch_one(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(record.into())
    }

    /// Returns the most recent feedback for an app, newest failure first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn find_by_app(&self, conn: &mut PgConnection, app_id: Uuid, limit: i64) -> Result<Vec<Feedback>> {
        let records = sqlx::query_as::<_, StoredFeedbackRecord>(
            r#"
            SELECT id, app_id, device_token, failed_at, created_at
            FROM feedback
            WHERE app_id = $1
            ORDER BY failed_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(app_id)
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }
}
