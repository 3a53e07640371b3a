//! Scan command - print current readings decoded from advertisements.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use govee_core::{ScanOptions, scan};
use govee_types::Reading;

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::util::format_rssi;

/// Execute the scan command.
pub async fn cmd_scan(args: &ScanArgs, config: &Config, all: bool, json: bool) -> Result<()> {
    let readings = scan_sorted(args, config)
        .await
        .context("Bluetooth scan failed")?;

    if readings.is_empty() {
        bail!(
            "No H5075 readings found. Ensure Bluetooth is enabled and the device is in range."
        );
    }

    let selected = if all { &readings[..] } else { &readings[..1] };

    if json {
        println!("{}", serde_json::to_string_pretty(selected)?);
        return Ok(());
    }

    for reading in selected {
        let mut line = format!(
            "{} [{}] temp={:.1}°C humidity={:.1}% battery={}% rssi={}",
            reading.name,
            reading.address,
            reading.temperature_c,
            reading.humidity_pct,
            reading.battery_pct,
            format_rssi(reading.rssi),
        );
        if reading.error {
            line.push_str(" error=true");
        }
        println!("{line}");
    }

    Ok(())
}

/// Scan and sort readings by signal strength, strongest first.
async fn scan_sorted(args: &ScanArgs, config: &Config) -> Result<Vec<Reading>> {
    let adapter = scan::get_adapter().await?;
    let options = scan_options(args, config);

    let mut readings = scan::scan_readings(&adapter, &options).await?;
    readings.sort_by_key(|reading| std::cmp::Reverse(reading.rssi.unwrap_or(i16::MIN)));
    Ok(readings)
}

/// Build core scan options from the CLI arguments.
pub fn scan_options(args: &ScanArgs, config: &Config) -> ScanOptions {
    let mut options = ScanOptions::new()
        .duration(Duration::from_secs(args.timeout))
        .name_contains(config.resolve_name_filter(args.name_contains.clone()));

    if let Some(mac) = args.mac.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        options = options.address(mac);
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(mac: Option<&str>, name_contains: Option<&str>) -> ScanArgs {
        ScanArgs {
            mac: mac.map(str::to_string),
            name_contains: name_contains.map(str::to_string),
            timeout: 10,
        }
    }

    #[test]
    fn test_scan_options_from_args() {
        let options = scan_options(&args(None, Some("Govee")), &Config::default());
        assert_eq!(options.duration, Duration::from_secs(10));
        assert_eq!(options.name_contains, "Govee");
        assert!(options.address.is_none());
    }

    #[test]
    fn test_blank_mac_is_ignored() {
        let options = scan_options(&args(Some("  "), None), &Config::default());
        assert!(options.address.is_none());
        assert_eq!(options.name_contains, "H5075");
    }

    #[test]
    fn test_explicit_mac_is_kept() {
        let options = scan_options(&args(Some("A4:C1:38:AA:BB:CC"), None), &Config::default());
        assert_eq!(options.address.as_deref(), Some("A4:C1:38:AA:BB:CC"));
    }
}
