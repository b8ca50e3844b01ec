use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use serde_json::Value;
use voyage_core::CoreError;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rows of the `business_rules` table onto the file-based defaults.
    /// Each row holds `{"value": <number>}`; unknown keys are ignored.
    pub async fn fetch_business_rules(
        &self,
        defaults: crate::app_config::BusinessRules,
    ) -> Result<crate::app_config::BusinessRules, sqlx::Error> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;

        for (key, value) in rows {
            let Some(v) = value.get("value") else { continue };
            match key.as_str() {
                "tax_rate" => {
                    if let Some(f) = v.as_f64() {
                        rules.tax_rate = f;
                    }
                }
                "service_fee_cents" => {
                    if let Some(i) = v.as_i64() {
                        rules.service_fee_cents = i;
                    }
                }
                "full_refund_hours" => {
                    if let Some(i) = v.as_i64() {
                        rules.full_refund_hours = i;
                    }
                }
                "partial_refund_hours" => {
                    if let Some(i) = v.as_i64() {
                        rules.partial_refund_hours = i;
                    }
                }
                "partial_refund_percent" => {
                    if let Some(p) = v.as_u64().and_then(|p| u8::try_from(p).ok()) {
                        rules.partial_refund_percent = p;
                    }
                }
                "rate_limit_per_minute" => {
                    if let Some(i) = v.as_i64() {
                        rules.rate_limit_per_minute = i;
                    }
                }
                other => tracing::debug!("Ignoring unknown business rule '{}'", other),
            }
        }

        Ok(rules)
    }
}

/// Map a driver error into the domain error, surfacing unique violations as conflicts.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return CoreError::Conflict(db_err.message().to_string());
        }
    }
    CoreError::StorageError(err.to_string())
}
