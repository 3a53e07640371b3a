//! Sync command - a scheduling gate over the history retrieval flow.
//!
//! Intended for cron/timer use: the run is skipped while the last success
//! is younger than the configured interval, and every attempt is recorded
//! in the store's sync-state table.

use anyhow::Result;
use govee_store::Store;
use time::OffsetDateTime;

use crate::cli::HistoryArgs;
use crate::commands::history::run_history_sync;
use crate::config::Config;
use crate::util::format_timestamp;

/// Sync-state row key for this job.
const JOB_NAME: &str = "history-sync";

/// Execute the sync command.
pub async fn cmd_sync(
    args: &HistoryArgs,
    config: &Config,
    store: &Store,
    days: Option<i64>,
    force: bool,
) -> Result<()> {
    let days = config.resolve_sync_days(days);
    let interval = time::Duration::days(days);
    let now = OffsetDateTime::now_utc();

    let state = store.get_or_create_sync_state(JOB_NAME)?;

    if !force && !state.is_due(now, interval) {
        // is_due only fails when a success time exists
        let last_success = state.last_success_at.unwrap_or(now);
        let remaining_hours = state
            .next_due(interval)
            .map(|due_at| (due_at - now).whole_hours().max(0))
            .unwrap_or(0);
        println!(
            "Skip: last successful sync at {} (next due in ~{remaining_hours}h)",
            format_timestamp(last_success)
        );
        return Ok(());
    }

    store.mark_sync_running(JOB_NAME)?;

    let report = match run_history_sync(args, config, store).await {
        Ok(report) => report,
        Err(e) => {
            store.mark_sync_error(JOB_NAME, &format!("{e:#}"))?;
            return Err(e);
        }
    };

    store.mark_sync_success(JOB_NAME)?;

    for failure in &report.outcome.failures {
        eprintln!("warning: {failure}");
    }

    let completed_at = store
        .get_sync_state(JOB_NAME)?
        .and_then(|state| state.last_success_at)
        .unwrap_or(now);
    println!(
        "History sync completed at {}: saved {} record(s), skipped {} duplicate(s) \
         (interval target: every {days} day(s))",
        format_timestamp(completed_at),
        report.saved,
        report.skipped,
    );

    Ok(())
}
