// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway connections and their authorisation lifecycle.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::backoff::BackoffPolicy;
use crate::error::{Error, ParseError, ProtocolError};
use crate::event::{ConnectionId, EventBus, PlatformEvent};
use crate::protocol::{FetchRequest, Fetcher, GatewayHttpConfig, LOGIN_PATH};
use crate::response::{LoginRequest, LoginResponse};

use super::config::{GatewayConfig, PlatformConfig};
use super::connection::{Connection, ConnectionState, Session};

/// Owns one connection record per configured gateway.
///
/// Locks are only held for reads and writes of the table, never across a
/// request.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::event::EventBus;
/// use powerwall_bridge::manager::{ConnectionManager, ConnectionState, GatewayConfig};
///
/// let manager = ConnectionManager::new(EventBus::new());
/// let id = manager
///     .add(&GatewayConfig::new("192.168.1.50", "me@example.com", "ABCDE"))
///     .unwrap();
///
/// assert_eq!(manager.state(id), Some(ConnectionState::Unauthorised));
/// assert_eq!(manager.len(), 1);
/// ```
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    events: EventBus,
    request_timeout: Duration,
    token_refresh: Duration,
    reconnection: BackoffPolicy,
    retry_delay: Option<Duration>,
}

impl ConnectionManager {
    /// Creates an empty manager with default timings.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            events,
            request_timeout: PlatformConfig::DEFAULT_REQUEST_TIMEOUT,
            token_refresh: PlatformConfig::DEFAULT_TOKEN_REFRESH,
            reconnection: BackoffPolicy::reconnect(),
            retry_delay: None,
        }
    }

    /// Creates an empty manager with the timings of a platform configuration.
    #[must_use]
    pub fn from_config(config: &PlatformConfig, events: EventBus) -> Self {
        Self::new(events)
            .with_request_timeout(config.request_timeout)
            .with_token_refresh(config.token_refresh)
            .with_reconnection(config.reconnection.clone())
    }

    /// Sets the login deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the token refresh interval.
    #[must_use]
    pub fn with_token_refresh(mut self, interval: Duration) -> Self {
        self.token_refresh = interval;
        self
    }

    /// Sets the reconnect backoff.
    #[must_use]
    pub fn with_reconnection(mut self, policy: BackoffPolicy) -> Self {
        self.reconnection = policy;
        self
    }

    /// Overrides the delay before a request's first retry.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Registers a gateway.
    ///
    /// # Errors
    ///
    /// Returns error if the host is not a valid address or the HTTP client
    /// cannot be built.
    pub fn add(&self, gateway: &GatewayConfig) -> Result<ConnectionId, ProtocolError> {
        let http = GatewayHttpConfig::new(&gateway.host)?;
        let mut fetcher = http.fetcher()?;
        if let Some(delay) = self.retry_delay {
            fetcher = fetcher.with_retry_delay(delay);
        }

        let connection = Connection::new(gateway, http, fetcher);
        let id = connection.id;
        tracing::debug!(connection = %id, host = connection.host(), "Added gateway connection");
        self.connections.write().insert(id, connection);
        Ok(id)
    }

    /// Returns all connection ids.
    #[must_use]
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.read().keys().copied().collect()
    }

    /// Returns the number of connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns `true` if there are no connections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Returns the state of a connection.
    #[must_use]
    pub fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.connections.read().get(&id).map(|c| c.state)
    }

    /// Returns the gateway host of a connection.
    #[must_use]
    pub fn host(&self, id: ConnectionId) -> Option<String> {
        self.connections.read().get(&id).map(|c| c.host().to_string())
    }

    /// Returns the number of consecutive failed logins.
    #[must_use]
    pub fn failures(&self, id: ConnectionId) -> Option<u32> {
        self.connections.read().get(&id).map(|c| c.failures)
    }

    /// Returns the wait before the next login attempt, derived from the
    /// consecutive failure count.
    #[must_use]
    pub fn reconnect_delay(&self, id: ConnectionId) -> Option<Duration> {
        let failures = self.failures(id)?;
        Some(self.reconnection.delay_for_attempt(failures.saturating_sub(1)))
    }

    /// Returns when the current token must be renewed.
    #[must_use]
    pub fn refresh_at(&self, id: ConnectionId) -> Option<Instant> {
        self.connections.read().get(&id).and_then(|c| c.refresh_at)
    }

    /// Returns `true` if the token refresh deadline has passed.
    #[must_use]
    pub fn refresh_due(&self, id: ConnectionId) -> bool {
        self.refresh_at(id).is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns the session of an authorised connection.
    #[must_use]
    pub fn session(&self, id: ConnectionId) -> Option<Session> {
        let connections = self.connections.read();
        let connection = connections.get(&id)?;
        if !connection.state.is_authorised() {
            return None;
        }
        Some(Session {
            http: connection.http.clone(),
            fetcher: connection.fetcher.clone(),
            token: connection.token.clone()?,
        })
    }

    /// Marks the token of an authorised connection as rejected.
    pub fn mark_token_expired(&self, id: ConnectionId) {
        let changed = {
            let mut connections = self.connections.write();
            match connections.get_mut(&id) {
                Some(connection) if connection.state.is_authorised() => {
                    connection.state = ConnectionState::TokenExpired;
                    connection.token = None;
                    connection.refresh_at = None;
                    tracing::info!(
                        connection = %id,
                        host = connection.host(),
                        "Gateway rejected session token"
                    );
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.publish_state(id, ConnectionState::TokenExpired);
        }
    }

    /// Logs in to the gateway.
    ///
    /// A host name that does not exist makes the connection terminally
    /// [`Unreachable`](ConnectionState::Unreachable); any other failure,
    /// including a temporary resolver error, leaves it
    /// [`Unauthorised`](ConnectionState::Unauthorised) for a later retry.
    ///
    /// # Errors
    ///
    /// Returns error if the connection is unknown or unreachable, or the login
    /// fails.
    pub async fn connect(&self, id: ConnectionId) -> Result<(), Error> {
        let (http, fetcher, username, email, password) = {
            let mut connections = self.connections.write();
            let connection = connections.get_mut(&id).ok_or(Error::ConnectionNotFound)?;
            if !connection.state.retry_allowed() {
                return Err(ProtocolError::HostNotFound(connection.host().to_string()).into());
            }
            connection.state = ConnectionState::Authorising;
            (
                connection.http.clone(),
                connection.fetcher.clone(),
                connection.username.clone(),
                connection.email.clone(),
                connection.password.clone(),
            )
        };
        self.publish_state(id, ConnectionState::Authorising);
        tracing::info!(connection = %id, host = http.host(), "Performing authorisation to gateway");

        match http.resolve().await {
            Ok(()) => {}
            Err(e @ ProtocolError::HostNotFound(_)) => {
                tracing::error!(
                    connection = %id,
                    host = http.host(),
                    "Gateway could not be found, check the configuration"
                );
                self.finish(id, ConnectionState::Unreachable, None);
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(
                    connection = %id,
                    host = http.host(),
                    error = %e,
                    "Gateway address lookup failed, will retry"
                );
                self.finish(id, ConnectionState::Unauthorised, None);
                return Err(e.into());
            }
        }

        let credentials = LoginRequest {
            username: &username,
            password: &password,
            email: &email,
        };
        let outcome = self.login(&http, &fetcher, &credentials).await;

        match outcome {
            Ok(token) => {
                self.finish(id, ConnectionState::Authorised, Some(token));
                tracing::info!(connection = %id, host = http.host(), "Successfully authorised to gateway");
                Ok(())
            }
            Err(e) => {
                let timeout = matches!(&e, Error::Protocol(p) if p.is_timeout());
                if timeout {
                    tracing::warn!(
                        connection = %id,
                        host = http.host(),
                        "Failed to connect to gateway, will retry"
                    );
                } else {
                    tracing::warn!(
                        connection = %id,
                        host = http.host(),
                        error = %e,
                        "Authorisation to gateway failed, will retry"
                    );
                }
                self.finish(id, ConnectionState::Unauthorised, None);
                Err(e)
            }
        }
    }

    async fn login(
        &self,
        http: &GatewayHttpConfig,
        fetcher: &Fetcher,
        credentials: &LoginRequest<'_>,
    ) -> Result<String, Error> {
        let request = FetchRequest::post(http.url(LOGIN_PATH))
            .with_json(credentials)?
            .with_timeout(self.request_timeout);
        let response = fetcher.fetch(&request).await?;
        let login: LoginResponse = response.parse()?;
        if login.token.is_empty() {
            return Err(ParseError::MissingField("token".to_string()).into());
        }
        Ok(login.token)
    }

    fn finish(&self, id: ConnectionId, state: ConnectionState, token: Option<String>) {
        let updated = {
            let mut connections = self.connections.write();
            let Some(connection) = connections.get_mut(&id) else {
                return;
            };
            connection.state = state;
            if state.is_authorised() {
                connection.failures = 0;
                connection.refresh_at = Some(Instant::now() + self.token_refresh);
            } else {
                connection.failures = connection.failures.saturating_add(1);
                connection.refresh_at = None;
            }
            connection.token = token;
            true
        };
        if updated {
            self.publish_state(id, state);
        }
    }

    fn publish_state(&self, connection_id: ConnectionId, state: ConnectionState) {
        self.events.publish(PlatformEvent::ConnectionChanged {
            connection_id,
            state,
        });
    }

    /// Drops all connections.
    pub fn clear(&self) {
        self.connections.write().clear();
    }
}
