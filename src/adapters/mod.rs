pub mod apns;
pub mod database;
