// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform event types.

use crate::manager::ConnectionState;
use crate::protocol::Resource;

use super::{AccessoryId, ConnectionId};

/// Events emitted by the platform.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::event::{ConnectionId, PlatformEvent};
/// use powerwall_bridge::manager::ConnectionState;
///
/// let event = PlatformEvent::ConnectionChanged {
///     connection_id: ConnectionId::new(),
///     state: ConnectionState::Authorised,
/// };
/// assert!(event.is_connection());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// A connection changed state.
    ConnectionChanged {
        /// The connection.
        connection_id: ConnectionId,
        /// Its new state.
        state: ConnectionState,
    },

    /// An accessory was registered with the sink.
    DeviceAdded {
        /// Device serial number.
        serial: String,
        /// Registered accessory.
        accessory_id: AccessoryId,
    },

    /// An accessory was removed from the sink.
    DeviceRemoved {
        /// Device serial number.
        serial: String,
        /// Removed accessory.
        accessory_id: AccessoryId,
    },

    /// A device was seen for the first time while excluded.
    DeviceExcluded {
        /// Device serial number.
        serial: String,
    },

    /// A poll cycle produced a full set of snapshots.
    CycleCompleted {
        /// The connection.
        connection_id: ConnectionId,
        /// Number of snapshots processed.
        devices: usize,
    },

    /// A poll cycle was discarded.
    CycleDropped {
        /// The connection.
        connection_id: ConnectionId,
        /// Resources that failed. Empty when the bundle could not be normalized.
        missing: Vec<Resource>,
    },
}

impl PlatformEvent {
    /// Returns the connection this event belongs to, if any.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match self {
            Self::ConnectionChanged { connection_id, .. }
            | Self::CycleCompleted { connection_id, .. }
            | Self::CycleDropped { connection_id, .. } => Some(*connection_id),
            Self::DeviceAdded { .. } | Self::DeviceRemoved { .. } | Self::DeviceExcluded { .. } => {
                None
            }
        }
    }

    /// Returns the device serial number this event belongs to, if any.
    #[must_use]
    pub fn serial(&self) -> Option<&str> {
        match self {
            Self::DeviceAdded { serial, .. }
            | Self::DeviceRemoved { serial, .. }
            | Self::DeviceExcluded { serial } => Some(serial),
            _ => None,
        }
    }

    /// Returns `true` if this is a connection event.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionChanged { .. })
    }

    /// Returns `true` if this is a device lifecycle event.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::DeviceAdded { .. } | Self::DeviceRemoved { .. } | Self::DeviceExcluded { .. }
        )
    }

    /// Returns `true` if this reports the outcome of a poll cycle.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleCompleted { .. } | Self::CycleDropped { .. })
    }
}
