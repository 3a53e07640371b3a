//! Bluetooth UUIDs for Govee H5075 devices.
//!
//! This module contains the UUIDs and the manufacturer id needed to
//! communicate with Govee H5075 hygrometers over Bluetooth Low Energy.

use uuid::{Uuid, uuid};

/// Govee manufacturer id carried in H5075 BLE advertisements.
pub const MANUFACTURER_ID: u16 = 0xEC88;

// --- Govee vendor characteristic UUIDs ---

/// Command characteristic: history requests are written here and the
/// transfer-complete notification arrives here.
pub const HISTORY_COMMAND: Uuid = uuid!("494e5445-4c4c-495f-524f-434b535f2012");

/// Data characteristic: historical record frames arrive as notifications.
pub const HISTORY_DATA: Uuid = uuid!("494e5445-4c4c-495f-524f-434b535f2013");

// --- Standard BLE characteristic UUIDs ---

/// GAP device name characteristic.
pub const DEVICE_NAME: Uuid = uuid!("00002a00-0000-1000-8000-00805f9b34fb");
