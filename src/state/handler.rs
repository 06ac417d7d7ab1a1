// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device update handlers.
//!
//! A handler turns each snapshot of its device into an [`AccessoryUpdate`]
//! and keeps the last snapshot for read-back queries.

use chrono::{DateTime, Utc};

use crate::normalize::{DeviceSnapshot, DeviceType};
use crate::scale::percentage;

use super::{AccessoryUpdate, ChargingState, EnergyReading, HistoryEntry};

/// Battery output above which power is considered flowing, in W.
pub const MIN_WATTS: f64 = 100.0;

/// Ambient light level presented when there is no solar output.
pub const MIN_LUX: f64 = 0.0001;

/// Update handler of one tracked device.
#[derive(Debug, Clone)]
pub enum DeviceHandler {
    /// A battery unit.
    Battery(BatteryHandler),
    /// A gateway.
    Gateway(GatewayHandler),
}

impl DeviceHandler {
    /// Creates the handler matching a snapshot's device type.
    #[must_use]
    pub fn for_snapshot(snapshot: &DeviceSnapshot) -> Self {
        match snapshot.device_type {
            DeviceType::Battery => Self::Battery(BatteryHandler::default()),
            DeviceType::Gateway => Self::Gateway(GatewayHandler::default()),
        }
    }

    /// Processes a snapshot, stamping history with the current time.
    pub fn update(&mut self, snapshot: &DeviceSnapshot) -> AccessoryUpdate {
        self.update_at(snapshot, Utc::now())
    }

    /// Processes a snapshot taken at `now`.
    pub fn update_at(&mut self, snapshot: &DeviceSnapshot, now: DateTime<Utc>) -> AccessoryUpdate {
        match self {
            Self::Battery(handler) => handler.update_at(snapshot, now),
            Self::Gateway(handler) => handler.update(snapshot),
        }
    }

    /// Returns the output readings of the last snapshot.
    #[must_use]
    pub fn energy_reading(&self) -> EnergyReading {
        match self {
            Self::Battery(handler) => handler.energy_reading(),
            Self::Gateway(_) => EnergyReading::default(),
        }
    }

    /// Returns the last processed snapshot.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<&DeviceSnapshot> {
        match self {
            Self::Battery(handler) => handler.last.as_ref(),
            Self::Gateway(handler) => handler.last.as_ref(),
        }
    }
}

/// Derives battery unit state.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::state::{BatteryHandler, ChargingState};
/// # use powerwall_bridge::normalize::{DeviceSnapshot, DeviceType};
/// # let snapshot = DeviceSnapshot {
/// #     serial_number: "TG1".into(), device_type: DeviceType::Battery,
/// #     model: "Powerwall 2 AC".into(), description: "Tesla Powerwall 2 AC".into(),
/// #     manufacturer: "Tesla".into(), software_version: "23.44.0".into(),
/// #     online: true, excluded: false, backup_reserve_percent: 20.0,
/// #     energy_remaining: 6750.0, full_capacity: 13500.0, power_out: -1500.0,
/// #     voltage_out: 240.0, current_out: -6.2, powerflow: None, history_enabled: false,
/// # };
///
/// let mut handler = BatteryHandler::default();
/// let update = handler.update(&snapshot);
///
/// assert_eq!(update.charging, Some(ChargingState::Charging));
/// assert_eq!(update.power_flow, Some(false));
/// assert!((update.battery_level - 50.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatteryHandler {
    last: Option<DeviceSnapshot>,
}

impl BatteryHandler {
    /// Processes a snapshot, stamping history with the current time.
    pub fn update(&mut self, snapshot: &DeviceSnapshot) -> AccessoryUpdate {
        self.update_at(snapshot, Utc::now())
    }

    /// Processes a snapshot taken at `now`.
    pub fn update_at(&mut self, snapshot: &DeviceSnapshot, now: DateTime<Utc>) -> AccessoryUpdate {
        let level = percentage(snapshot.energy_remaining, snapshot.full_capacity);
        let flowing = snapshot.power_out > MIN_WATTS;
        let charging = if snapshot.power_out < 0.0 {
            ChargingState::Charging
        } else {
            ChargingState::NotCharging
        };

        let history = snapshot.history_enabled.then(|| HistoryEntry {
            time: now,
            status: flowing,
            volts: if flowing && snapshot.voltage_out > MIN_WATTS {
                snapshot.voltage_out
            } else {
                0.0
            },
            watts: if flowing { snapshot.power_out } else { 0.0 },
            amps: if flowing && snapshot.current_out > 0.0 {
                snapshot.current_out
            } else {
                0.0
            },
        });

        self.last = Some(snapshot.clone());

        AccessoryUpdate {
            fault: !snapshot.online,
            power_flow: Some(flowing),
            charging: Some(charging),
            battery_level: level,
            low_battery: level < snapshot.backup_reserve_percent,
            solar_lux: None,
            history,
        }
    }

    /// Returns the output readings of the last snapshot.
    ///
    /// Readings are reported only while power flows out of the battery.
    #[must_use]
    pub fn energy_reading(&self) -> EnergyReading {
        let Some(last) = &self.last else {
            return EnergyReading::default();
        };
        if last.power_out <= 0.0 {
            return EnergyReading::default();
        }

        EnergyReading {
            volts: if last.voltage_out > 0.0 { last.voltage_out } else { 0.0 },
            watts: last.power_out,
            amps: if last.current_out > 0.0 { last.current_out } else { 0.0 },
        }
    }
}

/// Derives gateway state from the site meters.
#[derive(Debug, Clone, Default)]
pub struct GatewayHandler {
    last: Option<DeviceSnapshot>,
}

impl GatewayHandler {
    /// Processes a snapshot.
    ///
    /// Without a battery meter the outlet and charging indicators are left
    /// unchanged.
    pub fn update(&mut self, snapshot: &DeviceSnapshot) -> AccessoryUpdate {
        let level = percentage(snapshot.energy_remaining, snapshot.full_capacity);
        let powerflow = snapshot.powerflow.as_ref();

        let (power_flow, charging) = match powerflow.and_then(|flow| flow.battery.as_ref()) {
            Some(battery) if battery.instant_power >= MIN_WATTS => {
                (Some(true), Some(ChargingState::NotCharging))
            }
            Some(battery) if battery.instant_power > 0.0 => {
                (Some(false), Some(ChargingState::NotCharging))
            }
            Some(_) if level < 100.0 => (Some(false), Some(ChargingState::Charging)),
            Some(_) => (Some(false), Some(ChargingState::NotCharging)),
            None => (None, None),
        };

        let solar = powerflow
            .and_then(|flow| flow.solar.as_ref())
            .map_or(0.0, |solar| solar.instant_power);

        self.last = Some(snapshot.clone());

        AccessoryUpdate {
            fault: !snapshot.online,
            power_flow,
            charging,
            battery_level: level,
            low_battery: level < snapshot.backup_reserve_percent,
            solar_lux: Some(if solar > 0.0 { solar } else { MIN_LUX }),
            history: None,
        }
    }
}
