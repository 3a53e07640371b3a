//! History command - retrieve records from device storage and persist them.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use govee_core::{
    HistoryOptions, RetryConfig, ScanOptions, SyncOutcome, parse_past_minutes, scan, sync,
};
use govee_store::Store;

use crate::cli::HistoryArgs;
use crate::config::Config;
use crate::util::format_timestamp;

/// Settle delay between connection attempts to one device.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Result of one history sync run, after persistence.
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub saved: usize,
    pub skipped: usize,
}

/// Execute the history command.
pub async fn cmd_history(
    args: &HistoryArgs,
    config: &Config,
    store: &Store,
    json: bool,
) -> Result<()> {
    let report = run_history_sync(args, config, store).await?;

    for failure in &report.outcome.failures {
        eprintln!("warning: {failure}");
    }
    eprintln!(
        "Saved {} historical record(s), skipped {} duplicate(s)",
        report.saved, report.skipped
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report.outcome.points)?);
        return Ok(());
    }

    for point in &report.outcome.points {
        println!(
            "{} {} [{}] temp={:.1}°C humidity={:.1}%",
            format_timestamp(point.measured_at),
            point.name,
            point.address,
            point.temperature_c,
            point.humidity_pct,
        );
    }

    Ok(())
}

/// Run discovery, retrieval and persistence; shared with the sync gate.
///
/// Error contract: a run that produced no points is an error — with every
/// per-device failure enumerated when there were any, or a bare
/// "no records" when discovery simply came up empty.
pub async fn run_history_sync(
    args: &HistoryArgs,
    config: &Config,
    store: &Store,
) -> Result<SyncReport> {
    let start_minutes = parse_past_minutes(&args.start)?;
    let end_minutes = parse_past_minutes(&args.end)?;

    let adapter = scan::get_adapter()
        .await
        .context("Failed to acquire Bluetooth adapter")?;

    let mut scan_options = ScanOptions::new()
        .duration(Duration::from_secs(args.timeout))
        .name_contains(config.resolve_name_filter(args.name_contains.clone()));
    if let Some(mac) = args.mac.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        scan_options = scan_options.address(mac);
    }

    let history_options = HistoryOptions::new()
        .window(start_minutes, end_minutes)
        .timeout(Duration::from_secs(args.timeout));
    let retry = RetryConfig::new(args.retries).settle_delay(SETTLE_DELAY);

    let outcome = sync::sync_history(&adapter, &scan_options, &history_options, &retry)
        .await
        .context("Bluetooth history read failed")?;

    if outcome.points.is_empty() {
        if outcome.failures.is_empty() {
            bail!("No historical records returned.");
        }
        bail!(
            "History retrieval failed for every device:\n  {}",
            outcome.failures.join("\n  ")
        );
    }

    // Record the last-observed advertised name per address; user aliases
    // are left untouched.
    {
        let names: BTreeSet<(&str, &str)> = outcome
            .points
            .iter()
            .map(|p| (p.address.as_str(), p.name.as_str()))
            .collect();
        for (address, name) in names {
            store.upsert_detected_name(address, name)?;
        }
    }

    let saved = store.insert_history(&outcome.points)?;
    let skipped = outcome.points.len() - saved;

    Ok(SyncReport {
        outcome,
        saved,
        skipped,
    })
}
