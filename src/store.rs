//! Telemetry log and configuration tables.
//!
//! Two seams live here:
//! - [`TelemetryStore`]: the append-only `sensor_logs` table, which is also
//!   the only place the per-sensor alert state is kept.
//! - [`ConfigSource`]: the operator-edited `sensor_mapping` and
//!   `room_settings` tables, read fresh each cycle.
//!
//! [`PgStore`] implements both over a shared PostgreSQL pool.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{Classification, Reading, RoomMapping, StoreFailure, TemperatureBand, ThresholdConfig};

// ---

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Classification of the most recently written reading for a sensor.
    async fn last_classification(
        &self,
        sensor_id: &str,
    ) -> Result<Option<Classification>, StoreFailure>;

    /// Append one reading. Rows are never updated or deleted here.
    async fn append(&self, reading: &Reading) -> Result<(), StoreFailure>;
}

#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn room_mapping(&self) -> Result<RoomMapping, StoreFailure>;

    /// Room bands, with `default_band` for rooms that have none.
    async fn thresholds(
        &self,
        default_band: TemperatureBand,
    ) -> Result<ThresholdConfig, StoreFailure>;
}

pub type TelemetryStorePtr = Arc<dyn TelemetryStore>;
pub type ConfigSourcePtr = Arc<dyn ConfigSource>;

/// PostgreSQL-backed store. Cloning shares the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetryStore for PgStore {
    async fn last_classification(
        &self,
        sensor_id: &str,
    ) -> Result<Option<Classification>, StoreFailure> {
        // ---
        let status: Option<String> = sqlx::query_scalar(
            r#"
            SELECT status
              FROM sensor_logs
             WHERE sensor_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(&self.pool)
        .await?;

        status.map(|s| s.parse::<Classification>()).transpose()
    }

    async fn append(&self, reading: &Reading) -> Result<(), StoreFailure> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO sensor_logs (
                sensor_id, temperature, humidity, status, room_name, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&reading.sensor_id)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.classification.as_str())
        .bind(&reading.room_name)
        .bind(reading.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ConfigSource for PgStore {
    async fn room_mapping(&self) -> Result<RoomMapping, StoreFailure> {
        // ---
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT sensor_id, room_name FROM sensor_mapping")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    async fn thresholds(
        &self,
        default_band: TemperatureBand,
    ) -> Result<ThresholdConfig, StoreFailure> {
        // ---
        let rows: Vec<(String, f64, f64)> = sqlx::query_as(
            "SELECT room_name, min_temp::float8, max_temp::float8 FROM room_settings",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut config = ThresholdConfig::new(default_band);
        for (room_name, min, max) in rows {
            config.insert(room_name, TemperatureBand::new(min, max));
        }
        Ok(config)
    }
}
