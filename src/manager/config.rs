// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host configuration for the platform.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

use crate::backoff::BackoffPolicy;
use crate::error::ConfigError;

/// Account role used when none is configured.
pub const DEFAULT_USERNAME: &str = "customer";

/// Connection settings for one gateway.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::manager::GatewayConfig;
///
/// let gateway = GatewayConfig::new("192.168.1.50", "me@example.com", "ABCDE");
/// assert_eq!(gateway.username, "customer");
///
/// let installer = gateway.with_username("installer");
/// assert_eq!(installer.username, "installer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Gateway host, optionally with scheme and port.
    pub host: String,
    /// Account e-mail address.
    pub email: String,
    /// Gateway password.
    pub password: String,
    /// Account role.
    pub username: String,
}

impl GatewayConfig {
    /// Creates a gateway entry with the default `customer` role.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            email: email.into(),
            password: password.into(),
            username: DEFAULT_USERNAME.to_string(),
        }
    }

    /// Sets the account role. An empty value keeps the default.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        if !username.is_empty() {
            self.username = username;
        }
        self
    }

    /// Reads one `gateways[]` entry, returning `None` if it is incomplete.
    fn from_entry(entry: &Value) -> Option<Self> {
        let field = |name: &str| {
            entry
                .get(name)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        };

        let config = Self::new(field("gateway")?, field("email")?, field("password")?);
        Some(match field("username") {
            Some(username) => config.with_username(username),
            None => config,
        })
    }
}

/// Per-device overrides, keyed by serial number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Hide the device from the presentation layer.
    pub exclude: bool,
    /// Enable history linkage even when the global default is off.
    pub eve_history: bool,
}

impl DeviceOptions {
    fn from_entry(entry: &Value) -> Self {
        let flag = |name: &str| entry.get(name).and_then(Value::as_bool).unwrap_or(false);
        Self {
            exclude: flag("exclude"),
            eve_history: flag("eveHistory"),
        }
    }
}

/// Shared, runtime-adjustable view of the device overrides.
///
/// Cloning yields another handle onto the same table.
#[derive(Debug, Clone, Default)]
pub struct DeviceOverrides {
    history_default: bool,
    devices: Arc<RwLock<HashMap<String, DeviceOptions>>>,
}

impl DeviceOverrides {
    /// Creates overrides with the given global history default.
    #[must_use]
    pub fn new(history_default: bool, devices: HashMap<String, DeviceOptions>) -> Self {
        let devices = devices
            .into_iter()
            .map(|(serial, options)| (serial.to_uppercase(), options))
            .collect();
        Self {
            history_default,
            devices: Arc::new(RwLock::new(devices)),
        }
    }

    /// Returns the overrides for a serial number.
    #[must_use]
    pub fn get(&self, serial: &str) -> DeviceOptions {
        self.devices
            .read()
            .get(&serial.to_uppercase())
            .copied()
            .unwrap_or_default()
    }

    /// Returns `true` if the device is excluded.
    #[must_use]
    pub fn is_excluded(&self, serial: &str) -> bool {
        self.get(serial).exclude
    }

    /// Returns `true` if history is on globally or for this device.
    #[must_use]
    pub fn history_enabled(&self, serial: &str) -> bool {
        self.history_default || self.get(serial).eve_history
    }

    /// Changes the exclusion flag of a device. Takes effect on the next cycle.
    pub fn set_excluded(&self, serial: &str, exclude: bool) {
        self.devices
            .write()
            .entry(serial.to_uppercase())
            .or_default()
            .exclude = exclude;
    }
}

/// Wire shape of the host configuration document.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    gateways: Vec<Value>,
    #[serde(default)]
    options: HashMap<String, Value>,
    #[serde(default)]
    devices: HashMap<String, Value>,
}

/// Complete platform configuration.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::manager::PlatformConfig;
///
/// let json = r#"{
///     "gateways": [
///         {"gateway": "192.168.1.50", "email": "me@example.com", "password": "ABCDE"},
///         {"gateway": "", "email": "x", "password": "y"}
///     ],
///     "options": {"eveHistory": false},
///     "devices": {"tg1234": {"exclude": true}}
/// }"#;
/// let config = PlatformConfig::from_json(json).unwrap();
///
/// assert_eq!(config.gateways.len(), 1);
/// assert!(config.overrides.is_excluded("TG1234"));
/// assert!(!config.overrides.history_enabled("TG1234"));
/// ```
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Valid gateway entries.
    pub gateways: Vec<GatewayConfig>,
    /// Global history default and per-device overrides.
    pub overrides: DeviceOverrides,
    /// Time between poll cycles of one gateway.
    pub poll_interval: Duration,
    /// Deadline for each REST call.
    pub request_timeout: Duration,
    /// Attempts per REST call, first try included.
    pub request_attempts: u32,
    /// Re-login interval for session tokens.
    pub token_refresh: Duration,
    /// Backoff between failed logins.
    pub reconnection: BackoffPolicy,
}

impl PlatformConfig {
    /// Default time between poll cycles.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
    /// Default REST deadline.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default token refresh interval.
    pub const DEFAULT_TOKEN_REFRESH: Duration = Duration::from_secs(24 * 60 * 60);

    /// Creates an empty configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gateways: Vec::new(),
            overrides: DeviceOverrides::new(true, HashMap::new()),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            request_attempts: 1,
            token_refresh: Self::DEFAULT_TOKEN_REFRESH,
            reconnection: BackoffPolicy::reconnect(),
        }
    }

    /// Parses the host configuration document.
    ///
    /// Incomplete gateway entries are skipped. `options.eveHistory` defaults to
    /// `true` unless it is a boolean.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not a JSON object of the expected shape.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Same as [`from_json`](Self::from_json) for an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not a JSON object of the expected shape.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(value)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let gateways: Vec<GatewayConfig> = raw
            .gateways
            .iter()
            .filter_map(|entry| {
                let config = GatewayConfig::from_entry(entry);
                if config.is_none() {
                    tracing::debug!("Skipping incomplete gateway entry");
                }
                config
            })
            .collect();

        let history_default = raw
            .options
            .get("eveHistory")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let devices = raw
            .devices
            .iter()
            .map(|(serial, entry)| (serial.clone(), DeviceOptions::from_entry(entry)))
            .collect();

        Self {
            gateways,
            overrides: DeviceOverrides::new(history_default, devices),
            ..Self::new()
        }
    }

    /// Adds a gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateways.push(gateway);
        self
    }

    /// Sets the global history default, keeping per-device overrides.
    #[must_use]
    pub fn with_history_default(mut self, enabled: bool) -> Self {
        self.overrides.history_default = enabled;
        self
    }

    /// Sets overrides for one device.
    #[must_use]
    pub fn with_device(self, serial: &str, options: DeviceOptions) -> Self {
        self.overrides
            .devices
            .write()
            .insert(serial.to_uppercase(), options);
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the REST deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the attempts per REST call.
    #[must_use]
    pub fn with_request_attempts(mut self, attempts: u32) -> Self {
        self.request_attempts = attempts.max(1);
        self
    }

    /// Sets the token refresh interval.
    #[must_use]
    pub fn with_token_refresh(mut self, interval: Duration) -> Self {
        self.token_refresh = interval;
        self
    }

    /// Sets the login backoff policy.
    #[must_use]
    pub fn with_reconnection(mut self, policy: BackoffPolicy) -> Self {
        self.reconnection = policy;
        self
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incomplete_gateways_are_skipped() {
        let config = PlatformConfig::from_value(json!({
            "gateways": [
                {"gateway": "10.0.0.1", "email": "a@b.c", "password": "p"},
                {"gateway": "10.0.0.2", "email": "a@b.c"},
                {"gateway": "10.0.0.3", "email": "", "password": "p"},
                {"gateway": 42, "email": "a@b.c", "password": "p"},
                "not an object"
            ]
        }))
        .unwrap();

        assert_eq!(config.gateways.len(), 1);
        assert_eq!(config.gateways[0].host, "10.0.0.1");
    }

    #[test]
    fn username_defaults_to_customer() {
        let config = PlatformConfig::from_value(json!({
            "gateways": [
                {"gateway": "a", "email": "e", "password": "p", "username": ""},
                {"gateway": "b", "email": "e", "password": "p", "username": "installer"}
            ]
        }))
        .unwrap();

        assert_eq!(config.gateways[0].username, "customer");
        assert_eq!(config.gateways[1].username, "installer");
    }

    #[test]
    fn history_default_is_true_unless_boolean() {
        let missing = PlatformConfig::from_json("{}").unwrap();
        assert!(missing.overrides.history_enabled("ANY"));

        let junk = PlatformConfig::from_value(json!({"options": {"eveHistory": "no"}})).unwrap();
        assert!(junk.overrides.history_enabled("ANY"));

        let off = PlatformConfig::from_value(json!({"options": {"eveHistory": false}})).unwrap();
        assert!(!off.overrides.history_enabled("ANY"));
    }

    #[test]
    fn per_device_history_overrides_global_off() {
        let config = PlatformConfig::from_value(json!({
            "options": {"eveHistory": false},
            "devices": {"TG1": {"eveHistory": true}}
        }))
        .unwrap();

        assert!(config.overrides.history_enabled("TG1"));
        assert!(!config.overrides.history_enabled("TG2"));
    }

    #[test]
    fn device_keys_are_case_insensitive() {
        let config = PlatformConfig::from_value(json!({
            "devices": {"tg1abc": {"exclude": true}}
        }))
        .unwrap();

        assert!(config.overrides.is_excluded("TG1ABC"));
        assert!(config.overrides.is_excluded("tg1abc"));
    }

    #[test]
    fn non_boolean_exclude_is_false() {
        let config = PlatformConfig::from_value(json!({
            "devices": {"TG1": {"exclude": "yes"}}
        }))
        .unwrap();

        assert!(!config.overrides.is_excluded("TG1"));
    }

    #[test]
    fn set_excluded_is_shared_between_handles() {
        let overrides = DeviceOverrides::new(true, HashMap::new());
        let handle = overrides.clone();

        handle.set_excluded("tg9", true);
        assert!(overrides.is_excluded("TG9"));

        handle.set_excluded("TG9", false);
        assert!(!overrides.is_excluded("TG9"));
    }

    #[test]
    fn malformed_document_is_error() {
        assert!(matches!(
            PlatformConfig::from_json(r#"{"gateways": 3}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn builder_chain() {
        let config = PlatformConfig::new()
            .with_gateway(GatewayConfig::new("gw", "e", "p"))
            .with_poll_interval(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(2))
            .with_request_attempts(0)
            .with_token_refresh(Duration::from_secs(60))
            .with_history_default(false)
            .with_device("tg1", DeviceOptions {
                exclude: true,
                eve_history: false,
            });

        assert_eq!(config.gateways.len(), 1);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.request_attempts, 1);
        assert_eq!(config.token_refresh, Duration::from_secs(60));
        assert!(config.overrides.is_excluded("TG1"));
        assert!(!config.overrides.history_enabled("TG1"));
    }

    #[test]
    fn defaults() {
        let config = PlatformConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.token_refresh, Duration::from_secs(86_400));
        assert_eq!(config.reconnection, BackoffPolicy::reconnect());
    }
}
