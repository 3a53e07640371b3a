//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Reusable scan/filter arguments shared by advertisement commands.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Target device MAC address (optional), or use GOVEE_DEVICE env var
    #[arg(short, long, env = "GOVEE_DEVICE")]
    pub mac: Option<String>,

    /// Filter by device name substring when --mac is not provided
    /// (falls back to the config file, then "H5075")
    #[arg(short, long)]
    pub name_contains: Option<String>,

    /// BLE scan timeout in seconds
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,
}

/// Arguments for the history retrieval/sync flow.
#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    /// Target device MAC address; when omitted, every matching device
    /// discovered by scan is visited
    #[arg(short, long, env = "GOVEE_DEVICE")]
    pub mac: Option<String>,

    /// Name filter used for discovery when --mac is omitted
    #[arg(short, long)]
    pub name_contains: Option<String>,

    /// Oldest point in the past as hhh:mm or minutes (max 480:00 = 20 days)
    #[arg(long, default_value = "480:00")]
    pub start: String,

    /// Newest point in the past as hhh:mm or minutes
    #[arg(long, default_value = "0:00")]
    pub end: String,

    /// BLE connect/completion timeout in seconds
    #[arg(short, long, default_value = "25")]
    pub timeout: u64,

    /// Connection retries per device
    #[arg(short, long, default_value = "3")]
    pub retries: u32,
}

#[derive(Parser)]
#[command(name = "govee")]
#[command(author, version, about = "CLI for Govee H5075 hygrometers", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Database path (overrides the config file and platform default)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan advertisements and print current H5075 readings
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Print all matching readings (default prints strongest RSSI only)
        #[arg(short, long)]
        all: bool,
    },

    /// Store deduplicated raw advertisement snapshots
    Dump {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Retrieve historical records from device storage and store them
    History {
        #[command(flatten)]
        history: HistoryArgs,
    },

    /// Run the history retrieval only when the sync interval has elapsed
    Sync {
        #[command(flatten)]
        history: HistoryArgs,

        /// Minimum days between successful runs
        /// (falls back to the config file, then 4)
        #[arg(short, long)]
        days: Option<i64>,

        /// Run regardless of interval
        #[arg(short, long)]
        force: bool,
    },

    /// Manage device aliases
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
}

#[derive(Subcommand)]
pub enum AliasAction {
    /// List all known devices and their names
    List,
    /// Set a friendly label for a device address
    Set { address: String, alias: String },
    /// Remove the label for a device address
    Remove { address: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_history_defaults() {
        let cli = Cli::try_parse_from(["govee", "history"]).unwrap();
        let Commands::History { history } = cli.command else {
            panic!("expected history command");
        };

        assert_eq!(history.start, "480:00");
        assert_eq!(history.end, "0:00");
        assert_eq!(history.timeout, 25);
        assert_eq!(history.retries, 3);
        assert!(history.mac.is_none());
        assert!(history.name_contains.is_none());
    }

    #[test]
    fn test_sync_flags() {
        let cli =
            Cli::try_parse_from(["govee", "sync", "--force", "--days", "2", "--mac", "AA:BB"])
                .unwrap();
        let Commands::Sync {
            history,
            days,
            force,
        } = cli.command
        else {
            panic!("expected sync command");
        };

        assert!(force);
        assert_eq!(days, Some(2));
        assert_eq!(history.mac.as_deref(), Some("AA:BB"));
    }

    #[test]
    fn test_alias_subcommands() {
        let cli = Cli::try_parse_from(["govee", "alias", "set", "aa:bb", "Bedroom"]).unwrap();
        let Commands::Alias {
            action: AliasAction::Set { address, alias },
        } = cli.command
        else {
            panic!("expected alias set");
        };

        assert_eq!(address, "aa:bb");
        assert_eq!(alias, "Bedroom");
    }
}
