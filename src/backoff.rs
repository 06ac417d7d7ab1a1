// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exponential backoff policy shared by request retries and reconnection.

use std::time::Duration;

/// Exponential backoff schedule.
///
/// The same type drives two loops: the per-request retry inside the fetcher
/// and the per-gateway reconnect loop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use powerwall_bridge::BackoffPolicy;
///
/// let policy = BackoffPolicy::reconnect();
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(15));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(30));
/// assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(60));
///
/// let retry = BackoffPolicy::request_retry(3);
/// assert!(retry.should_retry(1));
/// assert!(!retry.should_retry(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Maximum number of retries before giving up (None = infinite).
    pub max_retries: Option<u32>,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per consecutive failure.
    pub backoff_multiplier: f32,
}

impl BackoffPolicy {
    /// Reconnect delay after the first failed login.
    pub const RECONNECT_INITIAL_DELAY: Duration = Duration::from_secs(15);
    /// Ceiling for reconnect delays.
    pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);
    /// Delay before the first request retry.
    pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);

    /// Policy for re-authorising a gateway: 15s doubling to 60s, forever.
    #[must_use]
    pub fn reconnect() -> Self {
        Self {
            max_retries: None,
            initial_delay: Self::RECONNECT_INITIAL_DELAY,
            max_delay: Self::RECONNECT_MAX_DELAY,
            backoff_multiplier: 2.0,
        }
    }

    /// Policy for a single request: `max_attempts - 1` retries, 500ms doubling,
    /// bounded only by the attempt count.
    #[must_use]
    pub fn request_retry(max_attempts: u32) -> Self {
        Self {
            max_retries: Some(max_attempts.saturating_sub(1)),
            initial_delay: Self::RETRY_INITIAL_DELAY,
            max_delay: Duration::MAX,
            backoff_multiplier: 2.0,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay after `attempt` consecutive failures, counted from 0.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        // initial_delay is at most minutes, far from f64 precision limits
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f64 * f64::from(multiplier);

        #[allow(clippy::cast_precision_loss)]
        let cap_ms = self.max_delay.as_millis() as f64;
        if delay_ms >= cap_ms {
            return self.max_delay;
        }

        // delay_ms is positive and below cap_ms here
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }

    /// Returns true if a retry is allowed after `attempt` retries so far.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.max_retries.is_none_or(|max| attempt < max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::reconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_sequence_doubles_and_caps() {
        let policy = BackoffPolicy::reconnect();
        let delays: Vec<u64> = (0..6)
            .map(|attempt| policy.delay_for_attempt(attempt).as_secs())
            .collect();
        assert_eq!(delays, vec![15, 30, 60, 60, 60, 60]);
    }

    #[test]
    fn reconnect_never_exceeds_ceiling() {
        let policy = BackoffPolicy::reconnect();
        for attempt in 0..200 {
            assert!(policy.delay_for_attempt(attempt) <= BackoffPolicy::RECONNECT_MAX_DELAY);
        }
    }

    #[test]
    fn request_retry_delays() {
        let policy = BackoffPolicy::request_retry(4);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
    }

    #[test]
    fn request_retry_counts() {
        let policy = BackoffPolicy::request_retry(3);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));

        let single = BackoffPolicy::request_retry(1);
        assert!(!single.should_retry(0));

        let zero = BackoffPolicy::request_retry(0);
        assert!(!zero.should_retry(0));
    }

    #[test]
    fn infinite_retries() {
        let policy = BackoffPolicy::reconnect();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(10_000));
    }

    #[test]
    fn custom_initial_delay_below_cap() {
        let policy = BackoffPolicy::reconnect()
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(25));
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(20));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(25));
    }
}
