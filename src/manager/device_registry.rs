// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tracked devices and their exclusion rules.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{AccessoryId, EventBus, PlatformEvent};
use crate::normalize::DeviceSnapshot;
use crate::sink::{AccessoryRequest, AccessorySink};
use crate::state::{AccessoryUpdate, DeviceHandler, EnergyReading};

/// A serial number the registry has seen.
struct TrackedDevice {
    accessory_id: AccessoryId,
    excluded: bool,
    handler: DeviceHandler,
}

/// What to tell the sink about one snapshot.
enum Action {
    /// First sighting, or back from exclusion.
    Register(AccessoryRequest, AccessoryUpdate),
    Update(AccessoryUpdate),
    /// Newly excluded while registered.
    Unregister,
    /// First sighting while excluded; the sink may hold a cached accessory.
    Exclude,
    Skip,
}

/// Maps snapshots onto accessories.
///
/// Serials are tracked from their first sighting until [`clear`](Self::clear).
/// Decisions are made under the table lock; sink calls happen after it is
/// released.
pub struct DeviceRegistry {
    tracked: Mutex<HashMap<String, TrackedDevice>>,
    sink: Arc<dyn AccessorySink>,
    events: EventBus,
}

impl DeviceRegistry {
    /// Creates an empty registry feeding the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AccessorySink>, events: EventBus) -> Self {
        Self {
            tracked: Mutex::new(HashMap::new()),
            sink,
            events,
        }
    }

    /// Applies one cycle's snapshots. Returns the number of updates pushed.
    pub fn process(&self, snapshots: &[DeviceSnapshot]) -> usize {
        snapshots
            .iter()
            .filter(|snapshot| self.process_one(snapshot))
            .count()
    }

    fn process_one(&self, snapshot: &DeviceSnapshot) -> bool {
        let serial = snapshot.serial_number.as_str();
        let accessory_id = AccessoryId::from_serial(serial);
        let action = self.decide(snapshot, accessory_id);

        match action {
            Action::Register(request, update) => {
                tracing::info!(serial, model = %snapshot.model, "Adding accessory");
                self.sink.register(request);
                self.events.publish(PlatformEvent::DeviceAdded {
                    serial: serial.to_string(),
                    accessory_id,
                });
                self.sink.update(accessory_id, update);
                true
            }
            Action::Update(update) => {
                self.sink.update(accessory_id, update);
                true
            }
            Action::Unregister => {
                tracing::info!(serial, "Removing accessory marked as excluded");
                self.remove(serial, accessory_id);
                false
            }
            Action::Exclude => {
                tracing::warn!(
                    serial,
                    description = %snapshot.description,
                    "Device is ignored due to it being marked as excluded"
                );
                self.events.publish(PlatformEvent::DeviceExcluded {
                    serial: serial.to_string(),
                });
                if self.sink.is_registered(accessory_id) {
                    self.remove(serial, accessory_id);
                }
                false
            }
            Action::Skip => false,
        }
    }

    fn decide(&self, snapshot: &DeviceSnapshot, accessory_id: AccessoryId) -> Action {
        let mut tracked = self.tracked.lock();
        let Some(device) = tracked.get_mut(&snapshot.serial_number) else {
            let mut handler = DeviceHandler::for_snapshot(snapshot);
            let action = if snapshot.excluded {
                Action::Exclude
            } else {
                let update = handler.update(snapshot);
                Action::Register(AccessoryRequest::from_snapshot(accessory_id, snapshot), update)
            };
            tracked.insert(
                snapshot.serial_number.clone(),
                TrackedDevice {
                    accessory_id,
                    excluded: snapshot.excluded,
                    handler,
                },
            );
            return action;
        };

        match (device.excluded, snapshot.excluded) {
            (false, false) => Action::Update(device.handler.update(snapshot)),
            (false, true) => {
                device.excluded = true;
                Action::Unregister
            }
            (true, false) => {
                device.excluded = false;
                let update = device.handler.update(snapshot);
                Action::Register(
                    AccessoryRequest::from_snapshot(device.accessory_id, snapshot),
                    update,
                )
            }
            (true, true) => Action::Skip,
        }
    }

    fn remove(&self, serial: &str, accessory_id: AccessoryId) {
        self.sink.unregister(accessory_id);
        self.events.publish(PlatformEvent::DeviceRemoved {
            serial: serial.to_string(),
            accessory_id,
        });
    }

    /// Returns the output readings of a tracked, included device.
    #[must_use]
    pub fn energy_reading(&self, accessory_id: AccessoryId) -> Option<EnergyReading> {
        self.tracked
            .lock()
            .values()
            .find(|device| device.accessory_id == accessory_id && !device.excluded)
            .map(|device| device.handler.energy_reading())
    }

    /// Returns the last snapshot of a tracked device.
    #[must_use]
    pub fn last_snapshot(&self, serial: &str) -> Option<DeviceSnapshot> {
        self.tracked
            .lock()
            .get(&serial.to_uppercase())
            .and_then(|device| device.handler.last_snapshot().cloned())
    }

    /// Returns `true` if the serial has been seen.
    #[must_use]
    pub fn is_tracked(&self, serial: &str) -> bool {
        self.tracked.lock().contains_key(&serial.to_uppercase())
    }

    /// Returns `true` if the serial is tracked as excluded.
    #[must_use]
    pub fn is_excluded(&self, serial: &str) -> bool {
        self.tracked
            .lock()
            .get(&serial.to_uppercase())
            .is_some_and(|device| device.excluded)
    }

    /// Returns the tracked serial numbers, sorted.
    #[must_use]
    pub fn serials(&self) -> Vec<String> {
        let mut serials: Vec<String> = self.tracked.lock().keys().cloned().collect();
        serials.sort();
        serials
    }

    /// Returns the number of tracked serials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.lock().len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.lock().is_empty()
    }

    /// Forgets all tracked devices.
    pub fn clear(&self) {
        self.tracked.lock().clear();
    }
}
