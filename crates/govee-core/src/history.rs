//! Historical record retrieval.
//!
//! The H5075 keeps up to 20 days of minute-resolution samples in on-device
//! storage. Retrieval is a notification-driven exchange over GATT: write a
//! request on the command characteristic, collect record frames from the
//! data characteristic, and stop when the device signals completion or the
//! caller's timeout elapses.
//!
//! Reaching the timeout without a completion signal is *not* an error —
//! devices stop transmitting without the terminator under marginal radio
//! conditions, and whatever was collected so far is returned.

use std::time::Duration;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use govee_types::HistoryPoint;
use govee_types::uuid::{DEVICE_NAME, HISTORY_COMMAND, HISTORY_DATA};

use crate::advertisement::DEFAULT_NAME;
use crate::commands::{
    MAX_MINUTES_BACK, build_history_request, is_transfer_complete, parse_history_frame,
};
use crate::error::{Error, Result};
use crate::scan::{find_peripheral, normalize_address};

/// Options for a history retrieval session.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Oldest requested point, in minutes before the request (max 28800).
    pub start_minutes: u16,
    /// Newest requested point, in minutes before the request.
    pub end_minutes: u16,
    /// Timeout for locating and connecting to the device.
    pub connect_timeout: Duration,
    /// How long to wait for the device's transfer-complete signal before
    /// settling for the records collected so far.
    pub completion_timeout: Duration,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            start_minutes: MAX_MINUTES_BACK,
            end_minutes: 0,
            connect_timeout: Duration::from_secs(20),
            completion_timeout: Duration::from_secs(20),
        }
    }
}

impl HistoryOptions {
    /// Create new history options with defaults (the full 20-day window).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested window as minutes into the past.
    #[must_use]
    pub fn window(mut self, start_minutes: u16, end_minutes: u16) -> Self {
        self.start_minutes = start_minutes;
        self.end_minutes = end_minutes;
        self
    }

    /// Set both the connect and completion timeouts.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.completion_timeout = timeout;
        self
    }

    /// Set the connect timeout only.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the completion-wait timeout only.
    #[must_use]
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }
}

/// Parse a past-time expression: `"hhh:mm"` or plain minutes.
///
/// Values are clamped to the device's 20-day storage horizon. Non-numeric
/// input is a format error and is never retried.
pub fn parse_past_minutes(value: &str) -> Result<u16> {
    let trimmed = value.trim();

    let minutes = match trimmed.split_once(':') {
        None => trimmed
            .parse::<u32>()
            .map_err(|_| Error::InvalidTimeExpression(value.to_string()))?,
        Some((hours, minutes)) => {
            let hours: u32 = hours
                .parse()
                .map_err(|_| Error::InvalidTimeExpression(value.to_string()))?;
            let minutes: u32 = minutes
                .parse()
                .map_err(|_| Error::InvalidTimeExpression(value.to_string()))?;
            hours * 60 + minutes
        }
    };

    Ok(minutes.min(u32::from(MAX_MINUTES_BACK)) as u16)
}

/// Retrieve a window of historical records from one device.
///
/// Runs the full session: locate, connect, subscribe, request, collect,
/// tear down. Errors before the request is written abort the attempt;
/// anything after degrades to partial data. The connection and both
/// notification subscriptions are released on every exit path, since the
/// adapter is an exclusively-owned resource and the next device may be
/// attempted right after.
///
/// Returned records are sorted by `measured_at` ascending.
pub async fn read_history(
    adapter: &Adapter,
    address: &str,
    options: &HistoryOptions,
) -> Result<Vec<HistoryPoint>> {
    let address = normalize_address(address);
    let peripheral = find_peripheral(adapter, &address, options.connect_timeout).await?;

    debug!("Connecting to {address}...");
    timeout(options.connect_timeout, peripheral.connect())
        .await
        .map_err(|_| Error::timeout("connect", options.connect_timeout))?
        .map_err(|e| Error::connection_failed(&address, e))?;

    if !peripheral.is_connected().await.unwrap_or(false) {
        return Err(Error::connection_failed(&address, "unable to connect"));
    }

    let result = run_session(&peripheral, &address, options).await;

    if let Err(e) = peripheral.disconnect().await {
        debug!("disconnect failed (ignored): {e}");
    }

    let mut points = result?;
    points.sort_by_key(|point| point.measured_at);

    info!("Retrieved {} history record(s) from {address}", points.len());
    Ok(points)
}

/// Everything that happens between connect and disconnect.
async fn run_session(
    peripheral: &Peripheral,
    address: &str,
    options: &HistoryOptions,
) -> Result<Vec<HistoryPoint>> {
    peripheral
        .discover_services()
        .await
        .map_err(|e| Error::setup_failed(address, e))?;

    let characteristics = peripheral.characteristics();
    let command_char = characteristics
        .iter()
        .find(|c| c.uuid == HISTORY_COMMAND)
        .cloned()
        .ok_or_else(|| Error::setup_failed(address, "command characteristic not found"))?;
    let data_char = characteristics
        .iter()
        .find(|c| c.uuid == HISTORY_DATA)
        .cloned()
        .ok_or_else(|| Error::setup_failed(address, "data characteristic not found"))?;

    // Best effort; a missing or unreadable name never fails the run.
    let name = read_device_name(peripheral, &characteristics).await;

    peripheral
        .subscribe(&command_char)
        .await
        .map_err(|e| Error::setup_failed(address, e))?;
    if let Err(e) = peripheral.subscribe(&data_char).await {
        unsubscribe_quietly(peripheral, &command_char).await;
        return Err(Error::setup_failed(address, e));
    }

    let outcome = collect_records(peripheral, address, &name, &command_char, options).await;

    unsubscribe_quietly(peripheral, &data_char).await;
    unsubscribe_quietly(peripheral, &command_char).await;

    outcome
}

/// Write the request and drain notifications until completion or timeout.
async fn collect_records(
    peripheral: &Peripheral,
    address: &str,
    name: &str,
    command_char: &Characteristic,
    options: &HistoryOptions,
) -> Result<Vec<HistoryPoint>> {
    // The stream must exist before the write so no frame is missed.
    let mut notifications = peripheral
        .notifications()
        .await
        .map_err(|e| Error::setup_failed(address, e))?;

    let packet = build_history_request(options.start_minutes, options.end_minutes);
    let issued_at = OffsetDateTime::now_utc();

    debug!(
        "Requesting history from {address}: {}..{} minutes back",
        options.start_minutes, options.end_minutes
    );
    peripheral
        .write(command_char, &packet, WriteType::WithResponse)
        .await
        .map_err(|e| Error::write_failed(address, e))?;

    let deadline = tokio::time::Instant::now() + options.completion_timeout;
    let mut points = Vec::new();
    let mut complete = false;

    while !complete {
        let notification = match tokio::time::timeout_at(deadline, notifications.next()).await {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                warn!("Notification stream closed before completion for {address}");
                break;
            }
            // Soft timeout: the device went quiet without the terminator.
            Err(_) => break,
        };

        if notification.uuid == HISTORY_COMMAND {
            if is_transfer_complete(&notification.value) {
                complete = true;
            }
        } else if notification.uuid == HISTORY_DATA {
            points.extend(frame_points(address, name, issued_at, &notification.value));
        }
    }

    if complete {
        debug!("{address} signalled transfer complete");
    } else {
        debug!(
            "Completion not observed for {address}; returning {} collected record(s)",
            points.len()
        );
    }

    Ok(points)
}

/// Convert one data frame into timestamped history points.
fn frame_points(
    address: &str,
    name: &str,
    issued_at: OffsetDateTime,
    frame: &[u8],
) -> Vec<HistoryPoint> {
    parse_history_frame(frame)
        .into_iter()
        .map(|sample| HistoryPoint {
            address: address.to_string(),
            name: name.to_string(),
            measured_at: issued_at - time::Duration::minutes(sample.minutes_back),
            temperature_c: sample.temperature_c,
            humidity_pct: sample.humidity_pct,
        })
        .collect()
}

/// Read the GAP device name, defaulting to `"H5075"` on any failure.
async fn read_device_name(
    peripheral: &Peripheral,
    characteristics: &std::collections::BTreeSet<Characteristic>,
) -> String {
    let Some(name_char) = characteristics.iter().find(|c| c.uuid == DEVICE_NAME) else {
        return DEFAULT_NAME.to_string();
    };

    match peripheral.read(name_char).await {
        Ok(raw) => {
            let decoded = String::from_utf8_lossy(&raw);
            let name = decoded.trim_matches('\0').trim();
            if name.is_empty() {
                DEFAULT_NAME.to_string()
            } else {
                name.to_string()
            }
        }
        Err(e) => {
            debug!("Device name read failed (using default): {e}");
            DEFAULT_NAME.to_string()
        }
    }
}

async fn unsubscribe_quietly(peripheral: &Peripheral, characteristic: &Characteristic) {
    if let Err(e) = peripheral.unsubscribe(characteristic).await {
        debug!("unsubscribe failed (ignored): {e}");
    }
}
