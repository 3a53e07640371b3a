//! Dump command - store deduplicated raw advertisement snapshots.

use anyhow::{Context, Result, bail};
use govee_core::{normalize_address, scan};
use govee_store::Store;
use govee_types::AdvertisementSnapshot;

use crate::cli::ScanArgs;
use crate::commands::scan::scan_options;
use crate::config::Config;
use crate::util::format_rssi;

/// Execute the dump command.
pub async fn cmd_dump(args: &ScanArgs, config: &Config, store: &Store, json: bool) -> Result<()> {
    let adapter = scan::get_adapter()
        .await
        .context("Failed to acquire Bluetooth adapter")?;
    let options = scan_options(args, config);

    let mut snapshots = scan::scan_snapshots(&adapter, &options)
        .await
        .context("Bluetooth scan failed")?;

    if snapshots.is_empty() {
        bail!("No H5075 snapshot data found.");
    }

    snapshots.sort_by_key(|snapshot| std::cmp::Reverse(snapshot.rssi.unwrap_or(i16::MIN)));

    // Record the advertised names, then resolve display names through any
    // user-set aliases before storing and printing.
    for snapshot in &snapshots {
        store.upsert_detected_name(&snapshot.address, &snapshot.name)?;
    }

    let addresses: Vec<String> = snapshots.iter().map(|s| s.address.clone()).collect();
    let name_map = store.name_map(&addresses)?;

    let resolved: Vec<AdvertisementSnapshot> = snapshots
        .into_iter()
        .map(|snapshot| {
            let name = name_map
                .get(&normalize_address(&snapshot.address))
                .cloned()
                .unwrap_or_else(|| snapshot.name.clone());
            AdvertisementSnapshot { name, ..snapshot }
        })
        .collect();

    let saved = store.insert_snapshots(&resolved)?;
    let skipped = resolved.len() - saved;
    eprintln!("Saved {saved} snapshot(s), skipped {skipped} duplicate(s)");

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    for snapshot in &resolved {
        let mut line = format!(
            "{} [{}] mfr={} payload={} temp={:.1}°C humidity={:.1}% battery={}% rssi={}",
            snapshot.name,
            snapshot.address,
            snapshot.manufacturer_id,
            snapshot.payload_hex,
            snapshot.temperature_c,
            snapshot.humidity_pct,
            snapshot.battery_pct,
            format_rssi(snapshot.rssi),
        );
        if snapshot.error {
            line.push_str(" error=true");
        }
        println!("{line}");
    }

    Ok(())
}
