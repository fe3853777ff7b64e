use crate::domain::{App, Environment};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub(crate) struct AppRecord {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) environment: String,
    pub(crate) certificate: String,
    pub(crate) password: Option<String>,
}

impl TryFrom<AppRecord> for App {
    type Error = String;

    fn try_from(record: AppRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            name: record.name,
            environment: record.environment.parse::<Environment>()?,
            certificate: record.certificate,
            password: record.password,
        })
    }
}
