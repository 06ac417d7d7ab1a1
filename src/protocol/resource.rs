// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fixed set of gateway REST resources.

use std::fmt;

/// Login resource, posted with the account credentials.
pub const LOGIN_PATH: &str = "/api/login/Basic";

/// Name of the session cookie carrying the login token.
pub const AUTH_COOKIE: &str = "AuthCookie";

/// A data resource fetched on every poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Network interfaces and their link state.
    Networks,
    /// Gateway identity and firmware version.
    Status,
    /// Battery pack inventory.
    Powerwalls,
    /// Instantaneous site, battery, load and solar meters.
    Powerflow,
    /// Aggregate energy figures and per-battery blocks.
    SystemStatus,
    /// Operating mode and backup reserve.
    Operation,
    /// Solar inverter inventory.
    Solar,
}

impl Resource {
    /// Every resource required for a complete cycle.
    pub const ALL: [Self; 7] = [
        Self::Networks,
        Self::Status,
        Self::Powerwalls,
        Self::Powerflow,
        Self::SystemStatus,
        Self::Operation,
        Self::Solar,
    ];

    /// Returns the REST path of the resource.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Networks => "/api/networks",
            Self::Status => "/api/status",
            Self::Powerwalls => "/api/powerwalls",
            Self::Powerflow => "/api/meters/aggregates",
            Self::SystemStatus => "/api/system_status",
            Self::Operation => "/api/operation",
            Self::Solar => "/api/solars",
        }
    }

    /// Returns the short name used in logs and bundles.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Networks => "networks",
            Self::Status => "status",
            Self::Powerwalls => "powerwalls",
            Self::Powerflow => "powerflow",
            Self::SystemStatus => "system_status",
            Self::Operation => "operation",
            Self::Solar => "solar",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds the cookie header value for a session token.
#[must_use]
pub fn auth_cookie(token: &str) -> String {
    format!("{AUTH_COOKIE}={token}")
}
