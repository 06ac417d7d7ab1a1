// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical device model.

use std::fmt;

use crate::response::Powerflow;

/// Manufacturer reported for every device.
pub const MANUFACTURER: &str = "Tesla";

/// Kind of device behind a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// The gateway itself.
    Gateway,
    /// A battery unit attached to a gateway.
    Battery,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gateway => write!(f, "gateway"),
            Self::Battery => write!(f, "battery"),
        }
    }
}

/// Normalized state of one device from one poll cycle.
///
/// Energies are in Wh, power in W, voltage in V and current in A. Battery
/// output readings are zero for gateways, and `powerflow` is only present on
/// gateways.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    /// Upper-case serial number.
    pub serial_number: String,
    /// Gateway or battery.
    pub device_type: DeviceType,
    /// Decoded model name.
    pub model: String,
    /// Display name, e.g. `Tesla Powerwall 2 AC`.
    pub description: String,
    /// Always [`MANUFACTURER`].
    pub manufacturer: String,
    /// Firmware version.
    pub software_version: String,
    /// Connectivity.
    pub online: bool,
    /// Hidden by configuration.
    pub excluded: bool,
    /// Share of capacity reserved for outages, in percent.
    pub backup_reserve_percent: f64,
    /// Stored energy.
    pub energy_remaining: f64,
    /// Usable capacity.
    pub full_capacity: f64,
    /// Battery output power. Negative while charging.
    pub power_out: f64,
    /// Battery output voltage.
    pub voltage_out: f64,
    /// Battery output current. Negative while charging.
    pub current_out: f64,
    /// Site meters, gateways only.
    pub powerflow: Option<Powerflow>,
    /// History linkage requested.
    pub history_enabled: bool,
}

impl DeviceSnapshot {
    /// Returns `true` for gateway snapshots.
    #[must_use]
    pub fn is_gateway(&self) -> bool {
        self.device_type == DeviceType::Gateway
    }

    /// Returns `true` for battery snapshots.
    #[must_use]
    pub fn is_battery(&self) -> bool {
        self.device_type == DeviceType::Battery
    }
}
