// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instantaneous power flow from `/api/meters/aggregates`.

use serde::{Deserialize, Serialize};

/// Meter readings for each leg of the installation.
///
/// Any leg may be absent, for example on sites without solar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Powerflow {
    /// Grid connection. Positive when importing.
    #[serde(default)]
    pub site: Option<Meter>,

    /// Battery. Positive when discharging.
    #[serde(default)]
    pub battery: Option<Meter>,

    /// House consumption.
    #[serde(default)]
    pub load: Option<Meter>,

    /// Solar generation.
    #[serde(default)]
    pub solar: Option<Meter>,
}

/// A single meter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    /// Real power in W.
    #[serde(default)]
    pub instant_power: f64,

    /// Average voltage in V.
    #[serde(default)]
    pub instant_average_voltage: f64,

    /// Total current in A.
    #[serde(default)]
    pub instant_total_current: f64,

    /// Timestamp of the last meter reading.
    #[serde(default)]
    pub last_communication_time: Option<String>,
}
