// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary to the host's accessory registry.

use crate::event::AccessoryId;
use crate::normalize::{DeviceSnapshot, DeviceType};
use crate::state::AccessoryUpdate;

/// Everything the host needs to create an accessory.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessoryRequest {
    /// Stable accessory id.
    pub accessory_id: AccessoryId,
    /// Device serial number.
    pub serial_number: String,
    /// Gateway or battery.
    pub device_type: DeviceType,
    /// Display name.
    pub description: String,
    /// Model name.
    pub model: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Firmware version.
    pub software_version: String,
    /// Link the accessory to a history timeline.
    pub history_enabled: bool,
}

impl AccessoryRequest {
    /// Builds a request from a snapshot.
    #[must_use]
    pub fn from_snapshot(accessory_id: AccessoryId, snapshot: &DeviceSnapshot) -> Self {
        Self {
            accessory_id,
            serial_number: snapshot.serial_number.clone(),
            device_type: snapshot.device_type,
            description: snapshot.description.clone(),
            model: snapshot.model.clone(),
            manufacturer: snapshot.manufacturer.clone(),
            software_version: snapshot.software_version.clone(),
            history_enabled: snapshot.history_enabled,
        }
    }
}

/// Presentation-layer registry implemented by the host application.
///
/// Calls are made from the polling tasks, never while internal locks are
/// held. Implementations must not block for long.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use parking_lot::Mutex;
/// use powerwall_bridge::event::AccessoryId;
/// use powerwall_bridge::sink::{AccessoryRequest, AccessorySink};
/// use powerwall_bridge::state::AccessoryUpdate;
///
/// #[derive(Default)]
/// struct Registry(Mutex<HashSet<AccessoryId>>);
///
/// impl AccessorySink for Registry {
///     fn register(&self, request: AccessoryRequest) {
///         self.0.lock().insert(request.accessory_id);
///     }
///     fn is_registered(&self, id: AccessoryId) -> bool {
///         self.0.lock().contains(&id)
///     }
///     fn unregister(&self, id: AccessoryId) {
///         self.0.lock().remove(&id);
///     }
///     fn update(&self, _id: AccessoryId, _update: AccessoryUpdate) {}
/// }
/// ```
pub trait AccessorySink: Send + Sync {
    /// Creates or restores an accessory.
    fn register(&self, request: AccessoryRequest);

    /// Returns `true` if the host still holds an accessory with this id,
    /// including one restored from its own cache.
    fn is_registered(&self, id: AccessoryId) -> bool;

    /// Removes an accessory.
    fn unregister(&self, id: AccessoryId);

    /// Pushes derived state to an accessory.
    fn update(&self, id: AccessoryId, update: AccessoryUpdate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::MANUFACTURER;

    #[test]
    fn request_copies_snapshot_identity() {
        let snapshot = DeviceSnapshot {
            serial_number: "TG1".to_string(),
            device_type: DeviceType::Battery,
            model: "Powerwall 3".to_string(),
            description: "Tesla Powerwall 3".to_string(),
            manufacturer: MANUFACTURER.to_string(),
            software_version: "24.4.0".to_string(),
            online: true,
            excluded: false,
            backup_reserve_percent: 0.0,
            energy_remaining: 0.0,
            full_capacity: 0.0,
            power_out: 0.0,
            voltage_out: 0.0,
            current_out: 0.0,
            powerflow: None,
            history_enabled: true,
        };
        let id = AccessoryId::from_serial("TG1");

        let request = AccessoryRequest::from_snapshot(id, &snapshot);
        assert_eq!(request.accessory_id, id);
        assert_eq!(request.serial_number, "TG1");
        assert_eq!(request.description, "Tesla Powerwall 3");
        assert_eq!(request.manufacturer, "Tesla");
        assert!(request.history_enabled);
    }
}
