use crate::adapters::database::records::AppRecord;
use crate::domain::App;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct AppRepository {}

impl AppRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Registers an app.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, app), fields(app.name = %app.name), err)]
    pub async fn create(&self, conn: &mut PgConnection, app: &App) -> Result<()> {
        sqlx::query("INSERT INTO apps (id, name, environment, certificate, password) VALUES ($1, $2, $3, $4, $5)")
            .bind(app.id)
            .bind(&app.name)
            .bind(app.environment.to_string())
            .bind(&app.certificate)
            .bind(app.password.as_deref())
            .execute(conn)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Loads every registered app.
    /// Rows with an unknown environment are logged and skipped.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn find_all(&self, conn: &mut PgConnection) -> Result<Vec<App>> {
        let records = sqlx::query_as::<_, AppRecord>(
            "SELECT id, name, environment, certificate, password FROM apps ORDER BY name",
        )
        .fetch_all(conn)
        .await?;

        let apps = records
            .into_iter()
            .filter_map(|record| {
                let name = record.name.clone();
                match App::try_from(record) {
                    Ok(app) => Some(app),
                    Err(e) => {
                        tracing::warn!(app = %name, error = %e, "Skipping app with invalid environment");
                        None
                    }
                }
            })
            .collect();

        Ok(apps)
    }

    /// Removes an app and, through the foreign key, its feedback.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the delete fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM apps WHERE id = $1").bind(id).execute(conn).await?;
        Ok(())
    }
}
