//! Database schema management for `roomwatch-collector`.
//!
//! Ensures the three tables the collector touches exist before the first
//! cycle. Applied once per run from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the collector's tables and indexes (idempotent).
///
/// - `sensor_mapping`: operator-edited sensor to room assignment
/// - `room_settings`: operator-edited temperature band per room
/// - `sensor_logs`: append-only telemetry log
///
/// Safe to call on every run; no-op if the objects already exist.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_mapping (
            sensor_id   TEXT PRIMARY KEY,
            room_name   TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS room_settings (
            room_name   TEXT PRIMARY KEY,
            min_temp    DOUBLE PRECISION NOT NULL,
            max_temp    DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_logs (
            id           BIGSERIAL PRIMARY KEY,
            sensor_id    TEXT             NOT NULL,
            temperature  DOUBLE PRECISION NOT NULL,
            humidity     DOUBLE PRECISION,
            status       TEXT             NOT NULL,
            room_name    TEXT             NOT NULL,
            created_at   TIMESTAMPTZ      NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Serves the "most recent row per sensor" lookup
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_logs_sensor_recent
            ON sensor_logs (sensor_id, created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
