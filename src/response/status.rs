// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway identity, network and operation payloads.

use serde::Deserialize;

/// Gateway identity from `/api/status`.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::response::GatewayStatus;
///
/// let json = r#"{
///     "din": "1232100-00-E--TG1234567890AB",
///     "version": "23.44.0 9064fc6a",
///     "device_type": "teg"
/// }"#;
/// let status: GatewayStatus = serde_json::from_str(json).unwrap();
/// assert_eq!(status.din, "1232100-00-E--TG1234567890AB");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayStatus {
    /// Device identification number, `<part number>--<serial>`.
    pub din: String,

    /// Firmware version, e.g. `23.44.0 9064fc6a`.
    pub version: String,

    /// Device type reported by the gateway.
    #[serde(default)]
    pub device_type: Option<String>,
}

/// One network interface from `/api/networks`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NetworkInterface {
    /// Interface name.
    #[serde(default)]
    pub network_name: String,

    /// Whether the interface is configured on.
    #[serde(default)]
    pub enabled: bool,

    /// Whether the interface currently carries traffic.
    #[serde(default)]
    pub active: bool,
}

impl NetworkInterface {
    /// Returns `true` if the interface is both enabled and active.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.enabled && self.active
    }
}

/// Operating settings from `/api/operation`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Operation {
    /// Active operating mode, e.g. `self_consumption`.
    #[serde(default)]
    pub real_mode: Option<String>,

    /// Share of capacity held back for outages, in percent.
    #[serde(default)]
    pub backup_reserve_percent: f64,
}
