// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform events and identifiers.
//!
//! The [`EventBus`] wraps a tokio broadcast channel. The platform publishes
//! connection state changes, device lifecycle changes and poll cycle outcomes
//! on it.
//!
//! # Examples
//!
//! ```
//! use powerwall_bridge::event::{ConnectionId, EventBus, PlatformEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(PlatformEvent::CycleCompleted {
//!     connection_id: ConnectionId::new(),
//!     devices: 2,
//! });
//! assert!(rx.try_recv().unwrap().is_cycle());
//! ```

mod event_bus;
mod ids;
mod platform_event;

pub use event_bus::EventBus;
pub use ids::{AccessoryId, ConnectionId};
pub use platform_event::PlatformEvent;
