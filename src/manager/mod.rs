// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway connections, poll cycles and device tracking.
//!
//! # Overview
//!
//! - [`ConnectionManager`]: one record per gateway with credentials, token and
//!   authorisation state; logs in and backs off after failures.
//! - [`Aggregator`]: fetches the seven gateway resources concurrently and
//!   only accepts a cycle in which all of them arrived.
//! - [`DeviceRegistry`]: tracks serial numbers, applies exclusion and
//!   forwards snapshots to per-device handlers and the sink.
//! - [`Platform`]: wires everything together and runs one supervisor task
//!   per gateway until shutdown.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use powerwall_bridge::event::PlatformEvent;
//! use powerwall_bridge::manager::{GatewayConfig, Platform, PlatformConfig};
//! # use powerwall_bridge::event::AccessoryId;
//! # use powerwall_bridge::sink::{AccessoryRequest, AccessorySink};
//! # use powerwall_bridge::state::AccessoryUpdate;
//! # struct Noop;
//! # impl AccessorySink for Noop {
//! #     fn register(&self, _: AccessoryRequest) {}
//! #     fn is_registered(&self, _: AccessoryId) -> bool { false }
//! #     fn unregister(&self, _: AccessoryId) {}
//! #     fn update(&self, _: AccessoryId, _: AccessoryUpdate) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() -> powerwall_bridge::Result<()> {
//!     let config = PlatformConfig::new()
//!         .with_gateway(GatewayConfig::new("192.168.1.50", "me@example.com", "ABCDE"));
//!     let platform = Platform::new(config, Arc::new(Noop))?;
//!
//!     let mut events = platform.subscribe();
//!     platform.start();
//!
//!     while let Ok(event) = events.recv().await {
//!         if let PlatformEvent::CycleCompleted { devices, .. } = event {
//!             println!("{devices} devices updated");
//!             break;
//!         }
//!     }
//!
//!     platform.shutdown().await;
//!     Ok(())
//! }
//! ```

mod aggregator;
mod config;
mod connection;
mod connection_manager;
mod device_registry;
mod platform;

pub use aggregator::{Aggregator, CycleOutcome};
pub use config::{
    DEFAULT_USERNAME, DeviceOptions, DeviceOverrides, GatewayConfig, PlatformConfig,
};
pub use connection::{ConnectionState, Session};
pub use connection_manager::ConnectionManager;
pub use device_registry::DeviceRegistry;
pub use platform::Platform;
