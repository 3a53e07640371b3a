//! Local data persistence for Govee H5075 sensor readings.
//!
//! This crate provides SQLite-based storage for the data the BLE layer
//! produces:
//!
//! - Historical measurements, deduplicated on `(address, measured_at)`
//! - Raw advertisement snapshots, deduplicated on
//!   `(address, manufacturer_id, payload_hex)`
//! - Device aliases (user label + last advertised name)
//! - Named sync-job state backing the scheduling gate
//!
//! Both deduplicated tables use insert-or-ignore semantics, so delivering
//! the same records twice is idempotent.
//!
//! # Example
//!
//! ```no_run
//! use govee_store::Store;
//!
//! let store = Store::open_default()?;
//! let total = store.count_history(None)?;
//! println!("{total} stored record(s)");
//! # Ok::<(), govee_store::Error>(())
//! ```

mod error;
mod models;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::SyncState;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/govee/data.db`
/// - macOS: `~/Library/Application Support/govee/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\govee\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("govee")
        .join("data.db")
}
