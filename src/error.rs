// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Failures are grouped by where they originate: the HTTP transport talking to
//! a gateway, decoding of gateway payloads, and the host configuration.

use std::fmt;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to a gateway.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a gateway payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The host configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No connection is registered under the given identifier.
    #[error("connection not found")]
    ConnectionNotFound,
}

/// Why a single HTTP exchange ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The gateway answered with a non-success status code.
    Status(u16),
    /// The request deadline elapsed.
    Timeout,
    /// Connection refused, reset, TLS failure and the like.
    Network(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Timeout => f.write_str("timed out"),
            Self::Network(message) => f.write_str(message),
        }
    }
}

/// Errors related to HTTP communication with a gateway.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request failed on every allowed attempt.
    #[error("request to {url} failed after {attempts} attempt(s): {cause}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// How many attempts were made.
        attempts: u32,
        /// The failure seen on the last attempt.
        cause: FailureCause,
    },

    /// The gateway host name does not exist.
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// The resolver could not answer for now.
    #[error("lookup of {host} failed: {reason}")]
    Lookup {
        /// The host that was looked up.
        host: String,
        /// The resolver's message.
        reason: String,
    },

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Returns the HTTP status code of the last attempt, if the gateway answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport {
                cause: FailureCause::Status(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }

    /// Returns the number of attempts made, if the request was sent at all.
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Transport { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Returns `true` if the last attempt hit its deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                cause: FailureCause::Timeout,
                ..
            }
        )
    }

    /// Returns `true` if the gateway rejected the session token or credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Errors related to decoding gateway payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected payload shape.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to the host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be decoded.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    /// No usable gateway entry was found.
    #[error("no valid gateway configured")]
    NoGateways,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
