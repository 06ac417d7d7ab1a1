// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derived presentation values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Charging indicator of a battery service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargingState {
    /// Idle or discharging.
    NotCharging,
    /// Taking energy in.
    Charging,
}

impl ChargingState {
    /// Returns `true` if charging.
    #[must_use]
    pub fn is_charging(self) -> bool {
        self == Self::Charging
    }
}

/// One sample for an energy history timeline.
///
/// Readings are zero unless the battery delivers more than the minimum power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Sample time.
    pub time: DateTime<Utc>,
    /// Whether power was flowing.
    pub status: bool,
    /// Output voltage in V.
    pub volts: f64,
    /// Output power in W.
    pub watts: f64,
    /// Output current in A.
    pub amps: f64,
}

/// Instantaneous output readings for on-demand queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    /// Output voltage in V.
    pub volts: f64,
    /// Output power in W.
    pub watts: f64,
    /// Output current in A.
    pub amps: f64,
}

/// Values pushed to the presentation layer after a snapshot.
///
/// Fields left as `None` keep their previous presented value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryUpdate {
    /// The device is offline.
    pub fault: bool,
    /// Outlet indicator: power flowing out of the battery.
    pub power_flow: Option<bool>,
    /// Battery charging indicator.
    pub charging: Option<ChargingState>,
    /// Charge level in percent.
    pub battery_level: f64,
    /// Charge level is below the backup reserve.
    pub low_battery: bool,
    /// Solar output presented as an ambient light level. Gateways only.
    pub solar_lux: Option<f64>,
    /// History sample, when history is enabled for the device.
    pub history: Option<HistoryEntry>,
}
