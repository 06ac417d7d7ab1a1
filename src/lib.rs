// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Powerwall Bridge - polls Tesla energy gateways on the local network and
//! turns their REST payloads into presentation-ready accessory state.
//!
//! Each configured gateway gets its own connection: the bridge logs in, keeps
//! the session token fresh, and every poll interval fetches seven resources
//! concurrently. A cycle is only used when all seven arrived. The payloads
//! are normalized into one snapshot per device (the gateway and each battery
//! unit), and per-device handlers derive the values handed to the host's
//! [`AccessorySink`](sink::AccessorySink).
//!
//! # Derived State
//!
//! - **Charge level**: stored energy scaled to 0-100% of capacity
//! - **Power flow**: battery output above 100 W
//! - **Charging**: battery output below zero, or gateway battery meter at or
//!   below zero while not full
//! - **Low battery**: charge level below the backup reserve
//! - **Solar**: solar output presented as an ambient light level
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use powerwall_bridge::event::AccessoryId;
//! use powerwall_bridge::manager::{Platform, PlatformConfig};
//! use powerwall_bridge::sink::{AccessoryRequest, AccessorySink};
//! use powerwall_bridge::state::AccessoryUpdate;
//!
//! struct Printer;
//!
//! impl AccessorySink for Printer {
//!     fn register(&self, request: AccessoryRequest) {
//!         println!("{} ({})", request.description, request.serial_number);
//!     }
//!     fn is_registered(&self, _id: AccessoryId) -> bool {
//!         false
//!     }
//!     fn unregister(&self, _id: AccessoryId) {}
//!     fn update(&self, _id: AccessoryId, update: AccessoryUpdate) {
//!         println!("{:.1}% low={}", update.battery_level, update.low_battery);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> powerwall_bridge::Result<()> {
//!     let config = PlatformConfig::from_json(r#"{
//!         "gateways": [
//!             {"gateway": "192.168.1.50", "email": "me@example.com", "password": "ABCDE"}
//!         ],
//!         "options": {"eveHistory": true},
//!         "devices": {"TG1234567890AB": {"exclude": false}}
//!     }"#)?;
//!
//!     let platform = Platform::new(config, Arc::new(Printer))?;
//!     platform.start();
//!
//!     tokio::time::sleep(Duration::from_secs(60)).await;
//!     platform.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events with structured fields such as
//! `connection`, `serial` and `resource`. Install a subscriber in the host to
//! see them.

pub mod backoff;
pub mod error;
pub mod event;
pub mod manager;
pub mod normalize;
pub mod protocol;
pub mod response;
pub mod scale;
pub mod sink;
pub mod state;

pub use backoff::BackoffPolicy;
pub use error::{ConfigError, Error, FailureCause, ParseError, ProtocolError, Result};
pub use event::{AccessoryId, ConnectionId, EventBus, PlatformEvent};
pub use manager::{
    Aggregator, ConnectionManager, ConnectionState, CycleOutcome, DeviceRegistry, GatewayConfig,
    Platform, PlatformConfig,
};
pub use normalize::{DeviceSnapshot, DeviceType};
pub use protocol::{Fetcher, GatewayHttpConfig, Resource};
pub use scale::{percentage, scale};
pub use sink::{AccessoryRequest, AccessorySink};
pub use state::{AccessoryUpdate, ChargingState, EnergyReading, HistoryEntry};
