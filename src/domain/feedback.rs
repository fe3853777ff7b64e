use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

/// A decoded feedback tuple: the device that stopped accepting notifications and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub failed_at: OffsetDateTime,
    pub device_token: String,
}

/// A feedback record after it has been persisted for an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub id: Uuid,
    pub app_id: Uuid,
    pub failed_at: OffsetDateTime,
    pub device_token: String,
    pub created_at: OffsetDateTime,
}

/// Renders a timestamp as `2011-12-10 16:08:45 UTC`.
#[must_use]
pub fn format_utc(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
