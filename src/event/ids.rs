// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier types.

use std::fmt;

use uuid::Uuid;

/// Unique identifier for a gateway connection.
///
/// Assigned when the connection is created; never persisted.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::event::ConnectionId;
///
/// let id = ConnectionId::new();
/// assert_ne!(id, ConnectionId::new());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new unique connection identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "ConnectionId({short}...)")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a presented accessory.
///
/// Derived from the device serial number, so the same serial maps to the same
/// id across cycles and restarts. Serials are compared case-insensitively.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::event::AccessoryId;
///
/// assert_eq!(AccessoryId::from_serial("tg123"), AccessoryId::from_serial("TG123"));
/// assert_ne!(AccessoryId::from_serial("TG123"), AccessoryId::from_serial("TG124"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccessoryId(Uuid);

impl AccessoryId {
    /// Derives the accessory id of a serial number.
    #[must_use]
    pub fn from_serial(serial: &str) -> Self {
        let name = format!("powerwall:{}", serial.to_uppercase());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AccessoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AccessoryId> for Uuid {
    fn from(id: AccessoryId) -> Self {
        id.0
    }
}
