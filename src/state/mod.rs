// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derived presentation state.
//!
//! Each tracked device owns a [`DeviceHandler`] that turns snapshots into
//! [`AccessoryUpdate`]s: outlet and charging indicators, charge level, low
//! battery flag and the solar light-level proxy.
//!
//! # Examples
//!
//! ```
//! use powerwall_bridge::state::{ChargingState, GatewayHandler};
//! use powerwall_bridge::response::{Meter, Powerflow};
//! # use powerwall_bridge::normalize::{DeviceSnapshot, DeviceType};
//! # let snapshot = |powerflow| DeviceSnapshot {
//! #     serial_number: "GW1".into(), device_type: DeviceType::Gateway,
//! #     model: "Backup Gateway 2".into(), description: "Tesla Backup Gateway 2".into(),
//! #     manufacturer: "Tesla".into(), software_version: "23.44.0".into(),
//! #     online: true, excluded: false, backup_reserve_percent: 20.0,
//! #     energy_remaining: 13500.0, full_capacity: 27000.0, power_out: 0.0,
//! #     voltage_out: 0.0, current_out: 0.0, powerflow: Some(powerflow), history_enabled: false,
//! # };
//!
//! let powerflow = Powerflow {
//!     battery: Some(Meter { instant_power: -2000.0, ..Meter::default() }),
//!     ..Powerflow::default()
//! };
//!
//! let update = GatewayHandler::default().update(&snapshot(powerflow));
//! assert_eq!(update.charging, Some(ChargingState::Charging));
//! assert_eq!(update.power_flow, Some(false));
//! ```

mod accessory_update;
mod handler;

pub use accessory_update::{AccessoryUpdate, ChargingState, EnergyReading, HistoryEntry};
pub use handler::{BatteryHandler, DeviceHandler, GatewayHandler, MIN_LUX, MIN_WATTS};
