// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-gateway connection record.

use std::fmt;

use tokio::time::Instant;

use crate::event::ConnectionId;
use crate::protocol::{Fetcher, GatewayHttpConfig};

use super::config::GatewayConfig;

/// Authorisation state of a gateway connection.
///
/// ```text
/// Unauthorised -> Authorising -> Authorised -> TokenExpired -> Authorising
///                      \
///                       -> Unreachable (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No valid token; a login may be attempted.
    Unauthorised,
    /// A login is in flight.
    Authorising,
    /// Holding a valid token.
    Authorised,
    /// The gateway rejected the token; re-login before the next cycle.
    TokenExpired,
    /// The host could not be resolved. No further attempts are made.
    Unreachable,
}

impl ConnectionState {
    /// Returns `true` while the connection holds a usable token.
    #[must_use]
    pub fn is_authorised(self) -> bool {
        self == Self::Authorised
    }

    /// Returns `true` unless the connection is terminally unreachable.
    #[must_use]
    pub fn retry_allowed(self) -> bool {
        self != Self::Unreachable
    }

    /// Returns `true` if a login should be attempted.
    #[must_use]
    pub fn needs_login(self) -> bool {
        matches!(self, Self::Unauthorised | Self::TokenExpired)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorised => "unauthorised",
            Self::Authorising => "authorising",
            Self::Authorised => "authorised",
            Self::TokenExpired => "token expired",
            Self::Unreachable => "unreachable",
        };
        f.write_str(name)
    }
}

/// Internal representation of a gateway in the connection manager.
pub(crate) struct Connection {
    pub id: ConnectionId,
    pub http: GatewayHttpConfig,
    pub fetcher: Fetcher,
    pub username: String,
    pub email: String,
    pub password: String,
    pub token: Option<String>,
    pub state: ConnectionState,
    /// Consecutive failed logins.
    pub failures: u32,
    /// When the token must be renewed.
    pub refresh_at: Option<Instant>,
}

impl Connection {
    pub fn new(gateway: &GatewayConfig, http: GatewayHttpConfig, fetcher: Fetcher) -> Self {
        Self {
            id: ConnectionId::new(),
            http,
            fetcher,
            username: gateway.username.clone(),
            email: gateway.email.clone(),
            password: gateway.password.clone(),
            token: None,
            state: ConnectionState::Unauthorised,
            failures: 0,
            refresh_at: None,
        }
    }

    /// Returns the gateway host for log fields.
    pub fn host(&self) -> &str {
        self.http.host()
    }
}

/// Everything needed to make authenticated calls, cloned out of the table so
/// no lock is held across requests.
#[derive(Debug, Clone)]
pub struct Session {
    /// Gateway address.
    pub http: GatewayHttpConfig,
    /// HTTP caller bound to the gateway's TLS settings.
    pub fetcher: Fetcher,
    /// Session token.
    pub token: String,
}
