// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform owner: wiring, supervisor tasks and shutdown.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, Error};
use crate::event::{AccessoryId, ConnectionId, EventBus, PlatformEvent};
use crate::sink::AccessorySink;
use crate::state::EnergyReading;

use super::aggregator::{Aggregator, CycleOutcome};
use super::config::PlatformConfig;
use super::connection::ConnectionState;
use super::connection_manager::ConnectionManager;
use super::device_registry::DeviceRegistry;

/// Polls every configured gateway and feeds an [`AccessorySink`].
///
/// [`start`](Self::start) spawns one supervisor task per connection. Each
/// supervisor authorises its gateway, backs off after failed logins, renews
/// the token when it is due, and runs one poll cycle per interval. Cycles of
/// one connection never overlap.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use powerwall_bridge::event::AccessoryId;
/// use powerwall_bridge::manager::{Platform, PlatformConfig};
/// use powerwall_bridge::sink::{AccessoryRequest, AccessorySink};
/// use powerwall_bridge::state::AccessoryUpdate;
///
/// struct Log;
///
/// impl AccessorySink for Log {
///     fn register(&self, request: AccessoryRequest) {
///         println!("new accessory {}", request.description);
///     }
///     fn is_registered(&self, _id: AccessoryId) -> bool {
///         false
///     }
///     fn unregister(&self, _id: AccessoryId) {}
///     fn update(&self, id: AccessoryId, update: AccessoryUpdate) {
///         println!("{id}: {:.0}%", update.battery_level);
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> powerwall_bridge::Result<()> {
///     let config = PlatformConfig::from_json(
///         r#"{"gateways": [{"gateway": "192.168.1.50", "email": "me@example.com", "password": "ABCDE"}]}"#,
///     )?;
///
///     let platform = Platform::new(config, Arc::new(Log))?;
///     platform.start();
///
///     tokio::time::sleep(Duration::from_secs(3600)).await;
///     platform.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Platform {
    config: PlatformConfig,
    connections: Arc<ConnectionManager>,
    registry: Arc<DeviceRegistry>,
    aggregator: Arc<Aggregator>,
    events: EventBus,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Platform {
    /// Creates a platform with one connection per valid gateway entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoGateways`] if no gateway could be added.
    pub fn new(config: PlatformConfig, sink: Arc<dyn AccessorySink>) -> Result<Self, Error> {
        Self::with_connections(config, sink, |manager| manager)
    }

    /// Same as [`new`](Self::new), letting the caller adjust the connection
    /// manager before gateways are added.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoGateways`] if no gateway could be added.
    pub fn with_connections(
        config: PlatformConfig,
        sink: Arc<dyn AccessorySink>,
        customize: impl FnOnce(ConnectionManager) -> ConnectionManager,
    ) -> Result<Self, Error> {
        let events = EventBus::new();
        let connections = customize(ConnectionManager::from_config(&config, events.clone()));

        for gateway in &config.gateways {
            if let Err(e) = connections.add(gateway) {
                tracing::warn!(host = %gateway.host, error = %e, "Skipping gateway");
            }
        }
        if connections.is_empty() {
            return Err(ConfigError::NoGateways.into());
        }

        let connections = Arc::new(connections);
        let registry = Arc::new(DeviceRegistry::new(sink, events.clone()));
        let aggregator = Arc::new(
            Aggregator::new(
                Arc::clone(&connections),
                Arc::clone(&registry),
                config.overrides.clone(),
                events.clone(),
            )
            .with_config(&config),
        );

        Ok(Self {
            config,
            connections,
            registry,
            aggregator,
            events,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Subscribes to platform events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }

    /// Returns the connection manager.
    #[must_use]
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Returns the device registry.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Spawns the supervisor tasks. Calling it again has no effect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() || self.cancel.is_cancelled() {
            return;
        }

        for id in self.connections.ids() {
            let supervisor = Supervisor {
                id,
                connections: Arc::clone(&self.connections),
                aggregator: Arc::clone(&self.aggregator),
                poll_interval: self.config.poll_interval,
                cancel: self.cancel.child_token(),
            };
            tasks.push(tokio::spawn(supervisor.run()));
        }
        tracing::debug!(connections = tasks.len(), "Started gateway supervisors");
    }

    /// Runs one poll cycle immediately, outside the supervisor schedule.
    ///
    /// Waits for a cycle of the same connection that is already running.
    /// After [`shutdown`](Self::shutdown) it returns
    /// [`CycleOutcome::Skipped`] without contacting the gateway.
    pub async fn poll_now(&self, id: ConnectionId) -> CycleOutcome {
        if self.cancel.is_cancelled() {
            return CycleOutcome::Skipped;
        }
        self.aggregator.poll_once(id).await
    }

    /// Changes the exclusion flag of a device. Takes effect on the next cycle.
    pub fn set_excluded(&self, serial: &str, exclude: bool) {
        self.config.overrides.set_excluded(serial, exclude);
    }

    /// Returns the output readings of an accessory.
    #[must_use]
    pub fn energy_reading(&self, accessory_id: AccessoryId) -> Option<EnergyReading> {
        self.registry.energy_reading(accessory_id)
    }

    /// Stops all supervisors, drops the gateway connections and forgets
    /// tracked devices. The platform cannot be started again.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for result in join_all(tasks).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Gateway supervisor ended abnormally");
            }
        }
        self.connections.clear();
        self.registry.clear();
        tracing::debug!("Platform stopped");
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drives one connection.
struct Supervisor {
    id: ConnectionId,
    connections: Arc<ConnectionManager>,
    aggregator: Arc<Aggregator>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl Supervisor {
    async fn run(self) {
        let id = self.id;
        loop {
            let Some(state) = self.connections.state(id) else {
                break;
            };
            if !state.retry_allowed() {
                tracing::debug!(connection = %id, "Gateway unreachable, supervisor stopping");
                break;
            }

            let refresh = self.connections.refresh_due(id);
            if refresh {
                tracing::info!(connection = %id, "Performing periodic re-authorisation to gateway");
            }
            if state.needs_login() || refresh {
                let result = tokio::select! {
                    () = self.cancel.cancelled() => break,
                    result = self.connections.connect(id) => result,
                };
                if result.is_err() {
                    if !self
                        .connections
                        .state(id)
                        .is_some_and(ConnectionState::retry_allowed)
                    {
                        continue;
                    }
                    let Some(delay) = self.connections.reconnect_delay(id) else {
                        break;
                    };
                    tracing::debug!(
                        connection = %id,
                        delay_secs = delay.as_secs(),
                        "Waiting before next authorisation attempt"
                    );
                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => continue,
                    }
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = self.aggregator.poll_once(id) => {}
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        tracing::debug!(connection = %id, "Gateway supervisor stopped");
    }
}
