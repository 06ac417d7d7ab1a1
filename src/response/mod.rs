// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway payload types.
//!
//! Numeric readings default to zero when a gateway omits them; identity fields
//! (`din`, `version`, battery serials) are required.

mod bundle;
mod login;
mod meters;
mod status;
mod system_status;

pub use bundle::RawResourceBundle;
pub use login::{LoginRequest, LoginResponse};
pub use meters::{Meter, Powerflow};
pub use status::{GatewayStatus, NetworkInterface, Operation};
pub use system_status::{BatteryBlock, SystemStatus};
