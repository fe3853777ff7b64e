mod app;
mod feedback;

pub(crate) use app::AppRecord;
pub(crate) use feedback::StoredFeedbackRecord;
