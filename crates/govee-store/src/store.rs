//! Main store implementation.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;
use tracing::{debug, info};

use govee_types::{AdvertisementSnapshot, DeviceAlias, HistoryPoint, SyncStatus};

use crate::error::{Error, Result};
use crate::models::SyncState;
use crate::schema;

/// SQLite-based store for H5075 sensor data.
pub struct Store {
    conn: Connection,
}

/// Normalize an address the way alias rows are keyed.
fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

// History operations
impl Store {
    /// Insert history points, ignoring `(address, measured_at)` duplicates.
    ///
    /// Returns the number of rows actually inserted; redundant delivery of
    /// the same records is a no-op.
    pub fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize> {
        let created_at = OffsetDateTime::now_utc().unix_timestamp();
        let mut inserted = 0;

        for point in points {
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO history
                 (address, name, measured_at, temperature_c, humidity_pct, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    point.address,
                    point.name,
                    point.measured_at.unix_timestamp(),
                    point.temperature_c,
                    point.humidity_pct,
                    created_at,
                ],
            )?;
        }

        info!(
            "Inserted {} new history record(s) ({} duplicate(s) skipped)",
            inserted,
            points.len() - inserted
        );
        Ok(inserted)
    }

    /// Query stored history, oldest first.
    pub fn query_history(
        &self,
        address: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryPoint>> {
        let mut sql = String::from(
            "SELECT address, name, measured_at, temperature_c, humidity_pct FROM history",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(address) = address {
            sql.push_str(" WHERE address = ?");
            params.push(Box::new(address.to_string()));
        }
        sql.push_str(" ORDER BY measured_at ASC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        debug!("Executing query: {sql}");
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let points = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok(HistoryPoint {
                    address: row.get(0)?,
                    name: row.get(1)?,
                    measured_at: OffsetDateTime::from_unix_timestamp(row.get(2)?).unwrap(),
                    temperature_c: row.get(3)?,
                    humidity_pct: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(points)
    }

    /// Count stored history records, optionally for one address.
    pub fn count_history(&self, address: Option<&str>) -> Result<u64> {
        let count: i64 = match address {
            Some(address) => self.conn.query_row(
                "SELECT COUNT(*) FROM history WHERE address = ?",
                [address],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }
}

// Snapshot operations
impl Store {
    /// Insert one advertisement snapshot.
    ///
    /// Returns `true` when a new row was created, `false` when the same
    /// `(address, manufacturer_id, payload_hex)` was already stored.
    pub fn insert_snapshot(&self, snapshot: &AdvertisementSnapshot) -> Result<bool> {
        let created_at = OffsetDateTime::now_utc().unix_timestamp();
        let service_uuids = serde_json::to_string(&snapshot.service_uuids)?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO snapshots
             (address, name, manufacturer_id, payload_hex, service_uuids,
              temperature_c, humidity_pct, battery_pct, error, rssi, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                snapshot.address,
                snapshot.name,
                snapshot.manufacturer_id,
                snapshot.payload_hex,
                service_uuids,
                snapshot.temperature_c,
                snapshot.humidity_pct,
                snapshot.battery_pct,
                snapshot.error,
                snapshot.rssi,
                created_at,
            ],
        )?;

        Ok(inserted > 0)
    }

    /// Insert a batch of snapshots; returns how many were new.
    pub fn insert_snapshots(&self, snapshots: &[AdvertisementSnapshot]) -> Result<usize> {
        let mut saved = 0;
        for snapshot in snapshots {
            if self.insert_snapshot(snapshot)? {
                saved += 1;
            }
        }

        info!(
            "Saved {} snapshot(s) ({} duplicate(s) skipped)",
            saved,
            snapshots.len() - saved
        );
        Ok(saved)
    }

    /// Count stored snapshots, optionally for one address.
    pub fn count_snapshots(&self, address: Option<&str>) -> Result<u64> {
        let count: i64 = match address {
            Some(address) => self.conn.query_row(
                "SELECT COUNT(*) FROM snapshots WHERE address = ?",
                [address],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }
}

// Alias operations
impl Store {
    /// Record the last-observed advertised name for an address.
    ///
    /// Creates the alias row when missing; a user-set alias is never
    /// touched, and an unchanged name does not bump `updated_at`.
    pub fn upsert_detected_name(&self, address: &str, detected_name: &str) -> Result<()> {
        let address = normalize(address);
        if address.is_empty() {
            return Ok(());
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.conn.execute(
            "INSERT INTO aliases (address, detected_name, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(address) DO UPDATE SET detected_name = ?2, updated_at = ?3
             WHERE detected_name <> ?2",
            rusqlite::params![address, detected_name.trim(), now],
        )?;

        Ok(())
    }

    /// Set a user alias for an address, creating the row when missing.
    pub fn set_alias(&self, address: &str, alias: &str) -> Result<()> {
        let address = normalize(address);
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "INSERT INTO aliases (address, alias, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(address) DO UPDATE SET alias = ?2, updated_at = ?3",
            rusqlite::params![address, alias, now],
        )?;

        Ok(())
    }

    /// Clear the user alias for an address, keeping the detected name.
    /// Returns `false` when no alias was set.
    pub fn remove_alias(&self, address: &str) -> Result<bool> {
        let address = normalize(address);
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let changed = self.conn.execute(
            "UPDATE aliases SET alias = NULL, updated_at = ?2
             WHERE address = ?1 AND alias IS NOT NULL",
            rusqlite::params![address, now],
        )?;

        Ok(changed > 0)
    }

    /// Get the alias row for an address.
    pub fn get_alias(&self, address: &str) -> Result<Option<DeviceAlias>> {
        let address = normalize(address);

        let alias = self
            .conn
            .query_row(
                "SELECT address, alias, detected_name, updated_at FROM aliases WHERE address = ?",
                [address],
                map_alias_row,
            )
            .optional()?;

        Ok(alias)
    }

    /// List all alias rows, ordered by alias then address.
    pub fn list_aliases(&self) -> Result<Vec<DeviceAlias>> {
        let mut stmt = self.conn.prepare(
            "SELECT address, alias, detected_name, updated_at FROM aliases
             ORDER BY alias, address",
        )?;

        let aliases = stmt
            .query_map([], map_alias_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(aliases)
    }

    /// Resolve the display name for one address:
    /// alias, then detected name, then the address itself.
    pub fn display_name(&self, address: &str) -> Result<String> {
        let normalized = normalize(address);
        Ok(match self.get_alias(&normalized)? {
            Some(row) => row.display_name().to_string(),
            None => normalized,
        })
    }

    /// Resolve display names for a set of addresses in one pass.
    pub fn name_map(&self, addresses: &[String]) -> Result<HashMap<String, String>> {
        let unique: BTreeSet<String> = addresses
            .iter()
            .map(|a| normalize(a))
            .filter(|a| !a.is_empty())
            .collect();

        let mut map = HashMap::new();
        for address in unique {
            let name = self.display_name(&address)?;
            map.insert(address, name);
        }

        Ok(map)
    }
}

// Sync state operations
impl Store {
    /// Get the state row for a named sync job.
    pub fn get_sync_state(&self, job_name: &str) -> Result<Option<SyncState>> {
        let state = self
            .conn
            .query_row(
                "SELECT job_name, last_attempt_at, last_success_at, last_status,
                        last_error, updated_at
                 FROM sync_state WHERE job_name = ?",
                [job_name],
                map_sync_state_row,
            )
            .optional()?;

        Ok(state)
    }

    /// Get the state row for a job, creating a fresh `never` row if absent.
    pub fn get_or_create_sync_state(&self, job_name: &str) -> Result<SyncState> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.conn.execute(
            "INSERT OR IGNORE INTO sync_state (job_name, updated_at) VALUES (?1, ?2)",
            rusqlite::params![job_name, now],
        )?;

        // The row exists now; read it back
        self.get_sync_state(job_name)?
            .ok_or_else(|| Error::JobNotFound(job_name.to_string()))
    }

    /// Record that an attempt is starting.
    pub fn mark_sync_running(&self, job_name: &str) -> Result<()> {
        self.get_or_create_sync_state(job_name)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "UPDATE sync_state SET last_attempt_at = ?2, last_status = 'running',
             last_error = '', updated_at = ?2 WHERE job_name = ?1",
            rusqlite::params![job_name, now],
        )?;

        debug!("Sync job '{job_name}' marked running");
        Ok(())
    }

    /// Record a successful run; sets `last_success_at` to now.
    pub fn mark_sync_success(&self, job_name: &str) -> Result<()> {
        self.get_or_create_sync_state(job_name)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "UPDATE sync_state SET last_success_at = ?2, last_status = 'success',
             last_error = '', updated_at = ?2 WHERE job_name = ?1",
            rusqlite::params![job_name, now],
        )?;

        debug!("Sync job '{job_name}' marked success");
        Ok(())
    }

    /// Record a failed run with its error message.
    pub fn mark_sync_error(&self, job_name: &str, message: &str) -> Result<()> {
        self.get_or_create_sync_state(job_name)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "UPDATE sync_state SET last_status = 'error', last_error = ?2,
             updated_at = ?3 WHERE job_name = ?1",
            rusqlite::params![job_name, message, now],
        )?;

        debug!("Sync job '{job_name}' marked error: {message}");
        Ok(())
    }
}

fn map_alias_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeviceAlias> {
    Ok(DeviceAlias {
        address: row.get(0)?,
        alias: row.get(1)?,
        detected_name: row.get(2)?,
        updated_at: OffsetDateTime::from_unix_timestamp(row.get(3)?).unwrap(),
    })
}

fn map_sync_state_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncState> {
    Ok(SyncState {
        job_name: row.get(0)?,
        last_attempt_at: row
            .get::<_, Option<i64>>(1)?
            .map(|ts| OffsetDateTime::from_unix_timestamp(ts).unwrap()),
        last_success_at: row
            .get::<_, Option<i64>>(2)?
            .map(|ts| OffsetDateTime::from_unix_timestamp(ts).unwrap()),
        last_status: SyncStatus::from_str_lossy(&row.get::<_, String>(3)?),
        last_error: row.get(4)?,
        updated_at: OffsetDateTime::from_unix_timestamp(row.get(5)?).unwrap(),
    })
}
