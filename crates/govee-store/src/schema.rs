//! Database schema and migrations.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if version < SCHEMA_VERSION {
        migrate(conn, version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- Historical measurements retrieved from device storage.
        -- Redundant delivery is idempotent: (address, measured_at) is unique
        -- and inserts use OR IGNORE.
        CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            measured_at INTEGER NOT NULL,
            temperature_c REAL NOT NULL,
            humidity_pct REAL NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(address, measured_at)
        );
        CREATE INDEX IF NOT EXISTS idx_history_address_time
            ON history(address, measured_at);

        -- Raw advertisement snapshots; identical payloads from the same
        -- device are the same snapshot.
        CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            manufacturer_id INTEGER NOT NULL,
            payload_hex TEXT NOT NULL,
            service_uuids TEXT NOT NULL DEFAULT '[]',
            temperature_c REAL NOT NULL,
            humidity_pct REAL NOT NULL,
            battery_pct INTEGER NOT NULL,
            error INTEGER NOT NULL DEFAULT 0,
            rssi INTEGER,
            created_at INTEGER NOT NULL,
            UNIQUE(address, manufacturer_id, payload_hex)
        );
        CREATE INDEX IF NOT EXISTS idx_snapshots_address
            ON snapshots(address, created_at);

        -- User labels and last-seen advertised names, keyed by normalized
        -- lowercase address.
        CREATE TABLE IF NOT EXISTS aliases (
            address TEXT PRIMARY KEY,
            alias TEXT,
            detected_name TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL
        );

        -- Named sync-job bookkeeping for the scheduling gate.
        CREATE TABLE IF NOT EXISTS sync_state (
            job_name TEXT PRIMARY KEY,
            last_attempt_at INTEGER,
            last_success_at INTEGER,
            last_status TEXT NOT NULL DEFAULT 'never',
            last_error TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;

    Ok(())
}

/// Run migrations from old_version to current.
fn migrate(conn: &Connection, old_version: i32) -> Result<()> {
    // Add future migrations here
    // if old_version < 2 { migrate_to_v2(conn)?; }

    let _ = old_version;
    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}
