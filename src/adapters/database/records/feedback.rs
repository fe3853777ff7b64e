use crate::domain::Feedback;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub(crate) struct StoredFeedbackRecord {
    pub(crate) id: Uuid,
    pub(crate) app_id: Uuid,
    pub(crate) device_token: String,
    pub(crate) failed_at: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
}

impl From<StoredFeedbackRecord> for Feedback {
    fn from(record: StoredFeedbackRecord) -> Self {
        Self {
            id: record.id,
            app_id: record.app_id,
            failed_at: record.failed_at,
            device_token: record.device_token,
            created_at: record.created_at,
        }
    }
}
