pub mod app;
pub mod feedback;

pub use app::{App, Environment};
pub use feedback::{Feedback, FeedbackRecord};
