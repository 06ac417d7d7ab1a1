// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linear range mapping.

/// Maps `value` from the source range onto the target range.
///
/// `value` is clamped into `[source_min, source_max]` first, so the result
/// always lies within the target range. A degenerate source range
/// (`source_max <= source_min`) maps to `target_min`.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::scale;
///
/// assert_eq!(scale(50.0, 0.0, 100.0, 0.0, 100.0), 50.0);
/// assert_eq!(scale(7.0, 0.0, 14.0, 0.0, 100.0), 50.0);
/// assert_eq!(scale(150.0, 0.0, 100.0, 0.0, 100.0), 100.0);
/// assert_eq!(scale(5.0, 0.0, 0.0, 0.0, 100.0), 0.0);
/// ```
#[must_use]
pub fn scale(value: f64, source_min: f64, source_max: f64, target_min: f64, target_max: f64) -> f64 {
    if source_max <= source_min || value.is_nan() {
        return target_min;
    }

    let value = value.clamp(source_min, source_max);
    (value - source_min) * (target_max - target_min) / (source_max - source_min) + target_min
}

/// Maps stored energy onto a 0-100 charge percentage.
#[must_use]
pub fn percentage(energy_remaining: f64, full_capacity: f64) -> f64 {
    scale(energy_remaining, 0.0, full_capacity, 0.0, 100.0)
}
