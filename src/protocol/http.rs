// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for gateway REST calls.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backoff::BackoffPolicy;
use crate::error::{FailureCause, ParseError, ProtocolError};

// ============================================================================
// GatewayHttpConfig - where and how to reach one gateway
// ============================================================================

/// Transport configuration for a single gateway.
///
/// Gateways serve HTTPS with self-signed certificates, so certificate
/// validation is disabled by default. The flag only affects the client built
/// from this configuration.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::protocol::GatewayHttpConfig;
///
/// let config = GatewayHttpConfig::new("192.168.1.50").unwrap();
/// assert_eq!(config.base_url(), "https://192.168.1.50");
/// assert_eq!(config.url("/api/status"), "https://192.168.1.50/api/status");
///
/// let local = GatewayHttpConfig::new("http://127.0.0.1:8080").unwrap();
/// assert_eq!(local.base_url(), "http://127.0.0.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayHttpConfig {
    url: Url,
    accept_invalid_certs: bool,
    connect_timeout: Duration,
}

impl GatewayHttpConfig {
    /// Default TCP connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given host.
    ///
    /// A bare host (optionally with `:port`) is reached over HTTPS; an explicit
    /// `http://` or `https://` prefix is kept as given.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] if the host cannot form a URL.
    pub fn new(host: impl AsRef<str>) -> Result<Self, ProtocolError> {
        let host = host.as_ref().trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "host is required".to_string(),
            ));
        }

        let raw = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };

        let url = Url::parse(&raw).map_err(|e| ProtocolError::InvalidAddress(format!("{host}: {e}")))?;
        if url.host_str().is_none() {
            return Err(ProtocolError::InvalidAddress(host.to_string()));
        }

        Ok(Self {
            url,
            accept_invalid_certs: true,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Enables or disables certificate validation for this gateway.
    #[must_use]
    pub fn with_certificate_validation(mut self, validate: bool) -> Self {
        self.accept_invalid_certs = !validate;
        self
    }

    /// Sets the TCP connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Returns the port, explicit or implied by the scheme.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(443)
    }

    /// Returns whether invalid certificates are accepted.
    #[must_use]
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Returns the scheme, host and port as a URL prefix.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Builds the absolute URL for a resource path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Checks that the host name resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::HostNotFound`] if the name does not exist, or
    /// [`ProtocolError::Lookup`] if the resolver failed for another reason.
    pub async fn resolve(&self) -> Result<(), ProtocolError> {
        let host = self.host().trim_start_matches('[').trim_end_matches(']');
        if is_reserved_invalid(host) {
            return Err(ProtocolError::HostNotFound(host.to_string()));
        }

        match tokio::net::lookup_host((host, self.port())).await {
            Ok(mut addrs) => {
                if addrs.next().is_some() {
                    Ok(())
                } else {
                    Err(ProtocolError::HostNotFound(host.to_string()))
                }
            }
            Err(e) => {
                tracing::debug!(host, error = %e, "Host lookup failed");
                Err(lookup_error(host, &e))
            }
        }
    }

    /// Creates a [`Fetcher`] bound to this gateway's TLS settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn fetcher(&self) -> Result<Fetcher, ProtocolError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Fetcher {
            client,
            retry_delay: BackoffPolicy::RETRY_INITIAL_DELAY,
        })
    }
}

// ============================================================================
// FetchRequest / FetchResponse
// ============================================================================

/// HTTP method for a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

/// A single logical HTTP call, including its retry budget.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: HttpMethod,
    url: String,
    headers: Vec<(&'static str, String)>,
    body: Option<String>,
    timeout: Option<Duration>,
    max_attempts: u32,
}

impl FetchRequest {
    /// Creates a `GET` request with a single attempt and no deadline.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a `POST` request with a single attempt and no deadline.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            max_attempts: 1,
        }
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Sets a raw request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns error if `value` cannot be serialized.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, ParseError> {
        let body = serde_json::to_string(value)?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the total number of attempts (first try included).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Successful response from a gateway.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    status: u16,
    body: String,
}

impl FetchResponse {
    /// Creates a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the body as JSON. An empty body yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, ParseError> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Parses the body into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON cannot be parsed into the target type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_value(self.json()?).map_err(Into::into)
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// Stateless HTTP caller with retry and exponential backoff.
///
/// A failed attempt (network error, deadline, or non-success status) is
/// retried after `500ms * 2^(attempt-1)` until the request's attempt budget
/// is spent.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry_delay: Duration,
}

impl Fetcher {
    /// Overrides the delay before the first retry.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Performs the request, retrying failed attempts.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] with the last failure and the
    /// number of attempts once the budget is exhausted.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, ProtocolError> {
        let policy = BackoffPolicy::request_retry(request.max_attempts)
            .with_initial_delay(self.retry_delay);
        let mut attempts = 0_u32;

        loop {
            attempts += 1;
            let cause = match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(cause) => cause,
            };

            let retries = attempts - 1;
            if !policy.should_retry(retries) {
                return Err(ProtocolError::Transport {
                    url: request.url.clone(),
                    attempts,
                    cause,
                });
            }

            let delay = policy.delay_for_attempt(retries);
            tracing::debug!(
                url = %request.url,
                attempt = attempts,
                cause = %cause,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(&self, request: &FetchRequest) -> Result<FetchResponse, FailureCause> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FailureCause::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify)?;
        Ok(FetchResponse::new(status.as_u16(), body))
    }
}

/// Resolver messages for a name that does not exist.
const UNKNOWN_HOST_MESSAGES: [&str; 4] = [
    "name or service not known",
    "no address associated with hostname",
    "nodename nor servname provided",
    "no such host is known",
];

/// Names under the `.invalid` top-level domain never resolve (RFC 6761).
fn is_reserved_invalid(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == "invalid" || host.ends_with(".invalid")
}

fn lookup_error(host: &str, err: &std::io::Error) -> ProtocolError {
    let reason = err.to_string();
    let lowered = reason.to_ascii_lowercase();
    if UNKNOWN_HOST_MESSAGES
        .iter()
        .any(|message| lowered.contains(message))
    {
        ProtocolError::HostNotFound(host.to_string())
    } else {
        ProtocolError::Lookup {
            host: host.to_string(),
            reason,
        }
    }
}

fn classify(err: reqwest::Error) -> FailureCause {
    if err.is_timeout() {
        FailureCause::Timeout
    } else {
        FailureCause::Network(err.to_string())
    }
}
