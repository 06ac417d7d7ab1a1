// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One poll cycle: fetch every resource, merge, normalize, dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Error;
use crate::event::{ConnectionId, EventBus, PlatformEvent};
use crate::normalize::normalize;
use crate::protocol::{FetchRequest, Resource, auth_cookie};
use crate::response::RawResourceBundle;

use super::config::{DeviceOverrides, PlatformConfig};
use super::connection::Session;
use super::connection_manager::ConnectionManager;
use super::device_registry::DeviceRegistry;

/// Result of [`Aggregator::poll_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The connection was not authorised.
    Skipped,
    /// At least one resource failed; nothing was dispatched.
    Incomplete {
        /// The failed resources.
        missing: Vec<Resource>,
    },
    /// Every resource arrived but the payloads could not be normalized.
    Invalid,
    /// Snapshots were dispatched to the registry.
    Completed {
        /// Number of snapshots.
        devices: usize,
    },
}

impl CycleOutcome {
    /// Returns `true` if snapshots were dispatched.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Runs poll cycles for the connections of a [`ConnectionManager`].
///
/// Cycles of one connection run one at a time.
pub struct Aggregator {
    connections: Arc<ConnectionManager>,
    cycles: Mutex<HashMap<ConnectionId, Arc<tokio::sync::Mutex<()>>>>,
    registry: Arc<DeviceRegistry>,
    overrides: DeviceOverrides,
    events: EventBus,
    request_timeout: Duration,
    request_attempts: u32,
}

impl Aggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(
        connections: Arc<ConnectionManager>,
        registry: Arc<DeviceRegistry>,
        overrides: DeviceOverrides,
        events: EventBus,
    ) -> Self {
        Self {
            connections,
            cycles: Mutex::new(HashMap::new()),
            registry,
            overrides,
            events,
            request_timeout: PlatformConfig::DEFAULT_REQUEST_TIMEOUT,
            request_attempts: 1,
        }
    }

    /// Applies the request timeout and attempt count of a configuration.
    #[must_use]
    pub fn with_config(mut self, config: &PlatformConfig) -> Self {
        self.request_timeout = config.request_timeout;
        self.request_attempts = config.request_attempts;
        self
    }

    /// Fetches all resources of one connection and dispatches the snapshots.
    ///
    /// Waits for a running cycle of the same connection to finish first.
    /// Does nothing unless the connection is authorised. A cycle with any
    /// failed resource is dropped as a whole. A rejected session token marks
    /// the connection for re-authorisation.
    pub async fn poll_once(&self, id: ConnectionId) -> CycleOutcome {
        let cycle = self.cycle_lock(id);
        let _running = cycle.lock().await;

        let Some(session) = self.connections.session(id) else {
            return CycleOutcome::Skipped;
        };

        let results = join_all(
            Resource::ALL
                .into_iter()
                .map(|resource| self.fetch_resource(&session, resource)),
        )
        .await;

        let mut parts = HashMap::with_capacity(results.len());
        let mut token_rejected = false;
        for (resource, result) in Resource::ALL.into_iter().zip(results) {
            match result {
                Ok(value) => {
                    parts.insert(resource, value);
                }
                Err(e) => {
                    if matches!(&e, Error::Protocol(p) if p.is_unauthorized()) {
                        token_rejected = true;
                    }
                    if !matches!(&e, Error::Protocol(p) if p.is_timeout()) {
                        tracing::debug!(
                            connection = %id,
                            resource = %resource,
                            error = %e,
                            "Error obtaining data from gateway"
                        );
                    }
                }
            }
        }

        if token_rejected {
            self.connections.mark_token_expired(id);
        }

        let bundle = match RawResourceBundle::from_parts(parts) {
            Ok(bundle) => bundle,
            Err(missing) => {
                self.events.publish(PlatformEvent::CycleDropped {
                    connection_id: id,
                    missing: missing.clone(),
                });
                return CycleOutcome::Incomplete { missing };
            }
        };

        let snapshots = match normalize(&bundle, &self.overrides) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::debug!(connection = %id, error = %e, "Discarding unusable gateway data");
                self.events.publish(PlatformEvent::CycleDropped {
                    connection_id: id,
                    missing: Vec::new(),
                });
                return CycleOutcome::Invalid;
            }
        };

        self.registry.process(&snapshots);
        self.events.publish(PlatformEvent::CycleCompleted {
            connection_id: id,
            devices: snapshots.len(),
        });
        CycleOutcome::Completed {
            devices: snapshots.len(),
        }
    }

    fn cycle_lock(&self, id: ConnectionId) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.cycles.lock().entry(id).or_default())
    }

    async fn fetch_resource(&self, session: &Session, resource: Resource) -> Result<Value, Error> {
        let request = FetchRequest::get(session.http.url(resource.path()))
            .with_header("content-type", "application/json")
            .with_header("cookie", auth_cookie(&session.token))
            .with_timeout(self.request_timeout)
            .with_max_attempts(self.request_attempts);

        let response = session.fetcher.fetch(&request).await?;
        Ok(response.json()?)
    }
}
