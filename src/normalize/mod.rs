// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion of raw gateway payloads into canonical device snapshots.
//!
//! Every complete poll cycle yields one gateway snapshot and one snapshot per
//! battery unit. Serial numbers are upper-cased and model names decoded from
//! part-number prefixes.

mod model;
mod normalizer;
mod snapshot;

pub use model::{battery_model, gateway_model, gateway_serial, sanitize_name, software_version};
pub use normalizer::normalize;
pub use snapshot::{DeviceSnapshot, DeviceType, MANUFACTURER};
