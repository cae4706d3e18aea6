//! Main store implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use tracing::{debug, info};
use wltdb_types::Reading;

use crate::error::{Error, Result};
use crate::models::{PivotRow, StoreStats};
use crate::queries::{PivotQuery, TimestampUniverse};
use crate::schema;

const UPSERT_SQL: &str = "INSERT INTO readings (device_id, timestamp, value) VALUES (?1, ?2, ?3)
     ON CONFLICT(device_id, timestamp) DO UPDATE SET value = excluded.value";

/// SQLite-based store for logger readings.
///
/// A store owns one connection. It is not meant to be shared between
/// threads or processes while writing; callers serialize access.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let unavailable = |source| Error::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(unavailable)?;
        schema::ensure_schema(&conn).map_err(unavailable)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the schema if it is missing. Already run by the constructors.
    pub fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.conn)?;
        Ok(())
    }

    /// Close the database, reporting any error from SQLite.
    ///
    /// Dropping a `Store` also closes it but discards that error.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

// Reading operations
impl Store {
    /// Insert a reading, replacing the value of an existing
    /// `(device_id, timestamp)` row.
    pub fn upsert(&self, reading: &Reading) -> Result<()> {
        upsert_on(&self.conn, reading)
    }

    /// Distinct device ids with at least one reading. Empty ids are left out.
    pub fn distinct_device_ids(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT device_id FROM readings WHERE device_id <> ''")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<BTreeSet<String>, _>>()?;
        Ok(ids)
    }

    /// All readings, optionally for one device, ordered by device and timestamp.
    pub fn readings(&self, device_id: Option<&str>) -> Result<Vec<Reading>> {
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(Reading {
                device_id: row.get(0)?,
                timestamp: row.get(1)?,
                value: row.get(2)?,
            })
        };

        let readings = match device_id {
            Some(id) => self
                .conn
                .prepare(
                    "SELECT device_id, timestamp, value FROM readings
                     WHERE device_id = ? ORDER BY timestamp",
                )?
                .query_map([id], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => self
                .conn
                .prepare(
                    "SELECT device_id, timestamp, value FROM readings
                     ORDER BY device_id, timestamp",
                )?
                .query_map([], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        Ok(readings)
    }

    /// Count readings, optionally for one device.
    pub fn count_readings(&self, device_id: Option<&str>) -> Result<u64> {
        let count: i64 = match device_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM readings WHERE device_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }

    /// Summary of the store contents.
    pub fn stats(&self) -> Result<StoreStats> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT device_id), MIN(timestamp), MAX(timestamp)
             FROM readings",
            [],
            |row| {
                Ok(StoreStats {
                    readings: row.get::<_, i64>(0)? as u64,
                    devices: row.get::<_, i64>(1)? as u64,
                    first_timestamp: row.get(2)?,
                    last_timestamp: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Pivot readings in a date window into one row per timestamp.
    ///
    /// Rows are ascending by timestamp. Each row carries one value slot per
    /// requested device id, in request order, `None` where that device has
    /// no reading at the timestamp. Which timestamps appear is decided by
    /// [`PivotQuery::universe`].
    pub fn query(&self, query: &PivotQuery) -> Result<Vec<PivotRow>> {
        let (from, to) = query.bounds()?;
        let width = query.device_ids.len();

        let mut columns: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, device_id) in query.device_ids.iter().enumerate() {
            columns.entry(device_id.as_str()).or_default().push(index);
        }

        debug!(
            "Pivot query {}..={} over {} columns ({:?})",
            from, to, width, query.universe
        );

        let mut pivot: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        let mut stmt = self.conn.prepare_cached(
            "SELECT device_id, timestamp, value FROM readings
             WHERE timestamp >= ?1 AND timestamp <= ?2",
        )?;
        let mut rows = stmt.query(params![from, to])?;

        while let Some(row) = rows.next()? {
            let device_id: String = row.get(0)?;
            let targets = columns.get(device_id.as_str());
            if targets.is_none() && query.universe == TimestampUniverse::RequestedDevices {
                continue;
            }

            let timestamp: String = row.get(1)?;
            let cells = pivot
                .entry(timestamp)
                .or_insert_with(|| vec![None; width]);

            if let Some(targets) = targets {
                let value: f64 = row.get(2)?;
                for &index in targets {
                    cells[index] = Some(value);
                }
            }
        }

        debug!("Pivot query produced {} rows", pivot.len());

        Ok(pivot
            .into_iter()
            .map(|(timestamp, values)| PivotRow { timestamp, values })
            .collect())
    }
}

pub(crate) fn upsert_on(conn: &Connection, reading: &Reading) -> Result<()> {
    conn.prepare_cached(UPSERT_SQL)?.execute(params![
        reading.device_id,
        reading.timestamp,
        reading.value
    ])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use wltdb_types::DateWindow;

    fn reading(device: &str, timestamp: &str, value: f64) -> Reading {
        Reading::new(device, timestamp, value)
    }

    fn day_query(day: time::Date) -> PivotQuery {
        PivotQuery::new(DateWindow::day(day))
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.distinct_device_ids().unwrap().is_empty());
        assert!(store.path().is_none());
    }

    #[test]
    fn test_upsert_replaces_value() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 20.0)).unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 21.5)).unwrap();

        assert_eq!(store.count_readings(None).unwrap(), 1);
        let readings = store.readings(Some("A")).unwrap();
        assert_eq!(readings[0].value, 21.5);
    }

    #[test]
    fn test_upsert_key_is_case_sensitive() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("a", "t", 1.0)).unwrap();
        store.upsert(&reading("A", "t", 2.0)).unwrap();
        assert_eq!(store.count_readings(None).unwrap(), 2);
    }

    #[test]
    fn test_distinct_device_ids_skips_empty() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("B", "t1", 1.0)).unwrap();
        store.upsert(&reading("A", "t1", 1.0)).unwrap();
        store.upsert(&reading("A", "t2", 1.0)).unwrap();
        store.upsert(&reading("", "t3", 1.0)).unwrap();

        let ids: Vec<_> = store.distinct_device_ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_stats() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());

        store.upsert(&reading("A", "2024-01-02 00:00:00", 1.0)).unwrap();
        store.upsert(&reading("B", "2024-01-01 00:00:00", 1.0)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.readings, 2);
        assert_eq!(stats.devices, 2);
        assert_eq!(stats.first_timestamp.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(stats.last_timestamp.as_deref(), Some("2024-01-02 00:00:00"));
    }

    #[test]
    fn test_query_dense_pivot_with_gaps() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 20.0)).unwrap();
        store.upsert(&reading("A", "2024-01-01 09:00:00", 21.0)).unwrap();
        store.upsert(&reading("B", "2024-01-01 08:00:00", 18.5)).unwrap();

        let rows = store
            .query(&day_query(date!(2024 - 01 - 01)).devices(["A", "B"]))
            .unwrap();

        assert_eq!(
            rows,
            vec![
                PivotRow {
                    timestamp: "2024-01-01 08:00:00".into(),
                    values: vec![Some(20.0), Some(18.5)],
                },
                PivotRow {
                    timestamp: "2024-01-01 09:00:00".into(),
                    values: vec![Some(21.0), None],
                },
            ]
        );
    }

    #[test]
    fn test_query_column_order_follows_request() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 1.0)).unwrap();
        store.upsert(&reading("B", "2024-01-01 08:00:00", 2.0)).unwrap();

        let ab = store
            .query(&day_query(date!(2024 - 01 - 01)).devices(["A", "B"]))
            .unwrap();
        let ba = store
            .query(&day_query(date!(2024 - 01 - 01)).devices(["B", "A"]))
            .unwrap();

        assert_eq!(ab[0].values, vec![Some(1.0), Some(2.0)]);
        assert_eq!(ba[0].values, vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn test_query_duplicate_device_gets_two_columns() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 1.0)).unwrap();

        let rows = store
            .query(&day_query(date!(2024 - 01 - 01)).devices(["A", "A"]))
            .unwrap();
        assert_eq!(rows[0].values, vec![Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_query_window_bounds_are_inclusive() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 00:00:00", 1.0)).unwrap();
        store.upsert(&reading("A", "2024-01-02 23:59:59", 2.0)).unwrap();
        store.upsert(&reading("A", "2024-01-03 00:00:00", 3.0)).unwrap();
        store.upsert(&reading("A", "2023-12-31 23:59:59", 0.0)).unwrap();

        let window = DateWindow::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02)).unwrap();
        let rows = store.query(&PivotQuery::new(window).device("A")).unwrap();

        let timestamps: Vec<_> = rows.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(timestamps, vec!["2024-01-01 00:00:00", "2024-01-02 23:59:59"]);
    }

    #[test]
    fn test_query_universe_all_devices_includes_unrequested_timestamps() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 1.0)).unwrap();
        store.upsert(&reading("Z", "2024-01-01 09:00:00", 9.0)).unwrap();

        let rows = store
            .query(&day_query(date!(2024 - 01 - 01)).device("A"))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values, vec![None]);

        let rows = store
            .query(
                &day_query(date!(2024 - 01 - 01))
                    .device("A")
                    .universe(TimestampUniverse::RequestedDevices),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, "2024-01-01 08:00:00");
    }

    #[test]
    fn test_query_without_devices_lists_timestamps() {
        let store = Store::open_in_memory().unwrap();
        store.upsert(&reading("A", "2024-01-01 08:00:00", 1.0)).unwrap();
        store.upsert(&reading("B", "2024-01-01 08:00:00", 1.0)).unwrap();

        let rows = store.query(&day_query(date!(2024 - 01 - 01))).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].values.is_empty());
    }

    #[test]
    fn test_open_creates_parent_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wltdb.db3");

        let store = Store::open(&path).unwrap();
        store.upsert(&reading("A", "t", 1.0)).unwrap();
        store.close().unwrap();

        let store = Store::open(&path).unwrap();
        assert_eq!(store.count_readings(Some("A")).unwrap(), 1);
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-db.db3");
        std::fs::write(&path, "this is plain text, definitely not sqlite").unwrap();

        let err = Store::open(&path).err().unwrap();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = Store::open(blocker.join("wltdb.db3")).err().unwrap();
        assert!(matches!(
            err,
            Error::CreateDirectory { .. } | Error::StorageUnavailable { .. }
        ));
    }
}
