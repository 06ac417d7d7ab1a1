// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model-number decoding and display names.

/// Length of the part-number prefix that identifies a model.
const PREFIX_LEN: usize = 7;

fn prefix(part_number: &str) -> &str {
    part_number.get(..PREFIX_LEN).unwrap_or("")
}

/// Decodes a gateway model from its `din`.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::normalize::gateway_model;
///
/// assert_eq!(gateway_model("1118431-01-E--TG0123"), "Backup Gateway 1");
/// assert_eq!(gateway_model("9999999--X"), "Gateway");
/// ```
#[must_use]
pub fn gateway_model(din: &str) -> &'static str {
    match prefix(din) {
        "1099752" => "Non-Backup Gateway",
        "1118431" => "Backup Gateway 1",
        "1152100" | "1232100" => "Backup Gateway 2",
        "1841000" => "Backup Gateway 3",
        _ => "Gateway",
    }
}

/// Decodes a battery model from its package part number.
///
/// # Examples
///
/// ```
/// use powerwall_bridge::normalize::battery_model;
///
/// assert_eq!(battery_model("3012170-05-C"), "Powerwall 2 AC");
/// assert_eq!(battery_model("1707000-11-J"), "Powerwall 3");
/// ```
#[must_use]
pub fn battery_model(part_number: &str) -> &'static str {
    match prefix(part_number) {
        "1092170" | "2012170" | "3012170" => "Powerwall 2 AC",
        "1112170" => "Powerwall 2 DC",
        "1707000" => "Powerwall 3",
        _ => "Powerwall",
    }
}

/// Normalizes a firmware version: `-` becomes `.` and anything after the
/// first space is dropped.
#[must_use]
pub fn software_version(raw: &str) -> String {
    raw.split(' ').next().unwrap_or_default().replace('-', ".")
}

/// Extracts the serial number from a gateway `din`.
///
/// The serial is the part after the first `--`. A `din` without separator is
/// used whole.
#[must_use]
pub fn gateway_serial(din: &str) -> String {
    din.split_once("--")
        .map_or(din, |(_, serial)| serial)
        .to_uppercase()
}

/// Makes a string acceptable as an accessory display name.
///
/// Keeps letters, digits, spaces and `’.,-`, and trims anything that is not a
/// letter or digit from both ends.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, '\u{2019}' | '.' | ',' | '-')
        })
        .collect();
    kept.trim_matches(|c: char| !c.is_alphanumeric()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_models() {
        assert_eq!(gateway_model("1099752-02-B--X"), "Non-Backup Gateway");
        assert_eq!(gateway_model("1118431--ABC123"), "Backup Gateway 1");
        assert_eq!(gateway_model("1152100-13-J--X"), "Backup Gateway 2");
        assert_eq!(gateway_model("1232100-00-E--X"), "Backup Gateway 2");
        assert_eq!(gateway_model("1841000-01-B--X"), "Backup Gateway 3");
        assert_eq!(gateway_model("short"), "Gateway");
        assert_eq!(gateway_model(""), "Gateway");
    }

    #[test]
    fn battery_models() {
        assert_eq!(battery_model("1092170-03-E"), "Powerwall 2 AC");
        assert_eq!(battery_model("2012170-25-E"), "Powerwall 2 AC");
        assert_eq!(battery_model("1112170-10-A"), "Powerwall 2 DC");
        assert_eq!(battery_model("1707000-21-K"), "Powerwall 3");
        assert_eq!(battery_model("0000000"), "Powerwall");
        assert_eq!(battery_model(""), "Powerwall");
    }

    #[test]
    fn version_is_normalized() {
        assert_eq!(software_version("23.44.0 eb113390"), "23.44.0");
        assert_eq!(software_version("1-50-1 abc"), "1.50.1");
        assert_eq!(software_version(""), "");
    }

    #[test]
    fn serial_after_separator() {
        assert_eq!(gateway_serial("1118431--ABC123"), "ABC123");
        assert_eq!(gateway_serial("1232100-00-E--tg1a--b"), "TG1A--B");
        assert_eq!(gateway_serial("nodashes"), "NODASHES");
    }

    #[test]
    fn names_are_sanitized() {
        assert_eq!(sanitize_name("Tesla Powerwall 2 AC"), "Tesla Powerwall 2 AC");
        assert_eq!(sanitize_name("  -Tesla (Gateway)! "), "Tesla Gateway");
        assert_eq!(sanitize_name("Bob’s Powerwall."), "Bob’s Powerwall");
        assert_eq!(sanitize_name("***"), "");
    }
}
