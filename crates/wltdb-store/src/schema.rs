//! Database schema.

use rusqlite::Connection;

/// Create the readings table and its index if they do not exist.
///
/// Safe to run on every open.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            device_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            value REAL NOT NULL,
            PRIMARY KEY (device_id, timestamp)
        );
        CREATE INDEX IF NOT EXISTS idx_readings_timestamp
            ON readings(timestamp);
        "#,
    )
}
