//! Device discovery and passive scanning.
//!
//! Two jobs live here: turning raw scan results into classified H5075
//! readings/snapshots, and resolving the set of target addresses the
//! history sync should visit.

use std::collections::BTreeSet;
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use govee_types::{AdvertisementSnapshot, Reading};

use crate::advertisement::{parse_advertisement, parse_manufacturer_data};
use crate::error::{Error, Result};

/// How often cached peripherals are re-checked while hunting for a
/// specific address.
const FIND_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Options for scanning and target discovery.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for advertisements.
    pub duration: Duration,
    /// Explicit target address; when set, name filtering is skipped and
    /// discovery resolves to exactly this device.
    pub address: Option<String>,
    /// Case-insensitive name substring filter used when no explicit address
    /// is given. An empty filter matches every discovered device.
    pub name_contains: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            address: None,
            name_contains: "H5075".to_string(),
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    #[must_use]
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }

    /// Target a single explicit address.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the name substring filter.
    #[must_use]
    pub fn name_contains(mut self, filter: impl Into<String>) -> Self {
        self.name_contains = filter.into();
        self
    }
}

/// Normalize a device address for matching and persistence.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Case-insensitive name filter; an empty filter matches everything.
fn name_matches(local_name: &str, filter: &str) -> bool {
    filter.is_empty() || local_name.to_lowercase().contains(&filter.to_lowercase())
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// Run one passive scan window and return everything the adapter saw.
async fn discovered_peripherals(adapter: &Adapter, duration: Duration) -> Result<Vec<Peripheral>> {
    info!("Starting BLE scan for {}s...", duration.as_secs());

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(duration).await;
    adapter.stop_scan().await?;

    Ok(adapter.peripherals().await?)
}

/// Scan for H5075 readings decoded from advertisements.
///
/// Every manufacturer-data entry of every matching device is offered to the
/// classifier; non-H5075 payloads are silently dropped. An empty result is
/// not an error.
pub async fn scan_readings(adapter: &Adapter, options: &ScanOptions) -> Result<Vec<Reading>> {
    let mut matches = Vec::new();

    each_matching_advertisement(adapter, options, |address, name, props| {
        for (manufacturer_id, data) in &props.manufacturer_data {
            if let Some(reading) =
                parse_manufacturer_data(address, name, *manufacturer_id, data, props.rssi)
            {
                matches.push(reading);
            }
        }
    })
    .await?;

    info!("Scan complete. Decoded {} reading(s)", matches.len());
    Ok(matches)
}

/// Scan for rich advertisement snapshots (reading + raw payload +
/// advertised service UUIDs) for persistence.
pub async fn scan_snapshots(
    adapter: &Adapter,
    options: &ScanOptions,
) -> Result<Vec<AdvertisementSnapshot>> {
    let mut matches = Vec::new();

    each_matching_advertisement(adapter, options, |address, name, props| {
        let service_uuids: Vec<String> = props.services.iter().map(|u| u.to_string()).collect();
        for (manufacturer_id, data) in &props.manufacturer_data {
            if let Some(snapshot) = parse_advertisement(
                address,
                name,
                *manufacturer_id,
                data,
                props.rssi,
                &service_uuids,
            ) {
                matches.push(snapshot);
            }
        }
    })
    .await?;

    info!("Scan complete. Decoded {} snapshot(s)", matches.len());
    Ok(matches)
}

/// Resolve the set of addresses a sync run should visit.
///
/// An explicit address short-circuits to a singleton set; otherwise every
/// scanned device whose name passes the filter is collected. Addresses are
/// normalized to lowercase, de-duplicated and sorted.
pub async fn discover_targets(adapter: &Adapter, options: &ScanOptions) -> Result<Vec<String>> {
    if let Some(address) = &options.address {
        return Ok(vec![normalize_address(address)]);
    }

    let mut targets = BTreeSet::new();
    each_matching_advertisement(adapter, options, |address, _, _| {
        targets.insert(normalize_address(address));
    })
    .await?;

    info!("Discovered {} target(s)", targets.len());
    Ok(targets.into_iter().collect())
}

/// Visit every scanned peripheral that passes the address/name filter.
async fn each_matching_advertisement<F>(
    adapter: &Adapter,
    options: &ScanOptions,
    mut visit: F,
) -> Result<()>
where
    F: FnMut(&str, &str, &btleplug::api::PeripheralProperties),
{
    let target = options.address.as_deref().map(normalize_address);
    let peripherals = discovered_peripherals(adapter, options.duration).await?;

    for peripheral in peripherals {
        let props = match peripheral.properties().await {
            Ok(Some(props)) => props,
            Ok(None) => continue,
            Err(e) => {
                debug!("Error reading peripheral properties: {e}");
                continue;
            }
        };

        let address = props.address.to_string();
        if let Some(target) = &target {
            if normalize_address(&address) != *target {
                continue;
            }
        }

        let local_name = props.local_name.as_deref().unwrap_or("").trim().to_string();
        if target.is_none() && !name_matches(&local_name, &options.name_contains) {
            continue;
        }

        visit(&address, &local_name, &props);
    }

    Ok(())
}

/// Find a specific peripheral by address, scanning until the timeout.
///
/// Peripherals cached from a previous scan are checked first; a fresh scan
/// is only started when the device is not already known to the adapter.
pub async fn find_peripheral(
    adapter: &Adapter,
    address: &str,
    timeout: Duration,
) -> Result<Peripheral> {
    let target = normalize_address(address);

    if let Some(peripheral) = peripheral_by_address(adapter, &target).await? {
        debug!("Found {target} in adapter cache (no scan needed)");
        return Ok(peripheral);
    }

    adapter.start_scan(ScanFilter::default()).await?;
    let deadline = Instant::now() + timeout;

    let found = loop {
        sleep(FIND_POLL_INTERVAL).await;
        if let Some(peripheral) = peripheral_by_address(adapter, &target).await? {
            break Some(peripheral);
        }
        if Instant::now() >= deadline {
            break None;
        }
    };

    if let Err(e) = adapter.stop_scan().await {
        debug!("stop_scan failed (ignored): {e}");
    }

    found.ok_or(Error::DeviceNotFound(target))
}

/// Search known peripherals for one matching the normalized address.
async fn peripheral_by_address(adapter: &Adapter, target: &str) -> Result<Option<Peripheral>> {
    for peripheral in adapter.peripherals().await? {
        if let Ok(Some(props)) = peripheral.properties().await {
            let address = normalize_address(&props.address.to_string());
            if address == target || address.replace(':', "") == target.replace(':', "") {
                return Ok(Some(peripheral));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.duration, Duration::from_secs(10));
        assert!(options.address.is_none());
        assert_eq!(options.name_contains, "H5075");
    }

    #[test]
    fn test_scan_options_builder() {
        let options = ScanOptions::new()
            .duration_secs(5)
            .address("A4:C1:38:AA:BB:CC")
            .name_contains("");

        assert_eq!(options.duration, Duration::from_secs(5));
        assert_eq!(options.address.as_deref(), Some("A4:C1:38:AA:BB:CC"));
        assert!(options.name_contains.is_empty());
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address(" A4:C1:38:AA:BB:CC "), "a4:c1:38:aa:bb:cc");
        assert_eq!(normalize_address("a4:c1:38:aa:bb:cc"), "a4:c1:38:aa:bb:cc");
    }

    #[test]
    fn test_name_matches_is_case_insensitive() {
        assert!(name_matches("GVH5075_AABB", "h5075"));
        assert!(name_matches("gvh5075_aabb", "H5075"));
        assert!(!name_matches("ThermoBeacon", "H5075"));
    }

    #[test]
    fn test_empty_name_filter_matches_everything() {
        assert!(name_matches("", ""));
        assert!(name_matches("anything", ""));
        // A non-empty filter still rejects nameless devices
        assert!(!name_matches("", "H5075"));
    }
}
