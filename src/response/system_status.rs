// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aggregate and per-battery energy figures from `/api/system_status`.

use serde::Deserialize;

/// System-wide battery totals and the attached battery blocks.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::response::SystemStatus;
///
/// let json = r#"{
///     "nominal_full_pack_energy": 27000,
///     "nominal_energy_remaining": 13500,
///     "battery_blocks": [{
///         "PackagePartNumber": "2012170-25-E",
///         "PackageSerialNumber": "tg1234",
///         "OpSeqState": "Active",
///         "nominal_energy_remaining": 6750,
///         "nominal_full_pack_energy": 13500,
///         "p_out": -240,
///         "v_out": 240.2,
///         "i_out": -1.0
///     }]
/// }"#;
/// let status: SystemStatus = serde_json::from_str(json).unwrap();
/// assert_eq!(status.battery_blocks.len(), 1);
/// assert_eq!(status.battery_blocks[0].package_serial_number, "tg1234");
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SystemStatus {
    /// Usable capacity across all batteries, in Wh.
    #[serde(default)]
    pub nominal_full_pack_energy: f64,

    /// Stored energy across all batteries, in Wh.
    #[serde(default)]
    pub nominal_energy_remaining: f64,

    /// One entry per battery pack.
    #[serde(default)]
    pub battery_blocks: Vec<BatteryBlock>,
}

/// A single battery pack.
#[derive(Debug, Clone, Deserialize)]
pub struct BatteryBlock {
    /// Pack part number; its first seven characters identify the model.
    #[serde(rename = "PackagePartNumber", default)]
    pub package_part_number: String,

    /// Pack serial number.
    #[serde(rename = "PackageSerialNumber")]
    pub package_serial_number: String,

    /// Operational sequence state, `Active` when in service.
    #[serde(rename = "OpSeqState", default)]
    pub op_seq_state: String,

    /// Stored energy, in Wh.
    #[serde(default)]
    pub nominal_energy_remaining: f64,

    /// Usable capacity, in Wh.
    #[serde(default)]
    pub nominal_full_pack_energy: f64,

    /// Output power in W. Negative while charging.
    #[serde(default)]
    pub p_out: f64,

    /// Output voltage in V.
    #[serde(default)]
    pub v_out: f64,

    /// Output current in A. Negative while discharging.
    #[serde(default)]
    pub i_out: f64,

    /// Pack firmware version.
    #[serde(default)]
    pub version: Option<String>,
}
