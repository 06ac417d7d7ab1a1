// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The merged result of one complete poll cycle.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;
use crate::protocol::Resource;

use super::{GatewayStatus, NetworkInterface, Operation, Powerflow, SystemStatus};

/// Parsed bodies of all seven resources from one cycle.
///
/// A bundle can only be built when every resource is present, so holding one
/// means the cycle was complete.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use powerwall_bridge::protocol::Resource;
/// use powerwall_bridge::response::RawResourceBundle;
///
/// let mut parts = HashMap::new();
/// parts.insert(Resource::Status, serde_json::json!({"din": "x--y", "version": "1"}));
///
/// let missing = RawResourceBundle::from_parts(parts).unwrap_err();
/// assert_eq!(missing.len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct RawResourceBundle {
    networks: Value,
    status: Value,
    powerwalls: Value,
    powerflow: Value,
    system_status: Value,
    operation: Value,
    solar: Value,
}

impl RawResourceBundle {
    /// Assembles a bundle, or returns the resources that are missing.
    ///
    /// # Errors
    ///
    /// Returns the list of missing resources when any is absent.
    pub fn from_parts(mut parts: HashMap<Resource, Value>) -> Result<Self, Vec<Resource>> {
        let missing: Vec<Resource> = Resource::ALL
            .into_iter()
            .filter(|resource| !parts.contains_key(resource))
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut take = |resource: Resource| parts.remove(&resource).unwrap_or(Value::Null);
        Ok(Self {
            networks: take(Resource::Networks),
            status: take(Resource::Status),
            powerwalls: take(Resource::Powerwalls),
            powerflow: take(Resource::Powerflow),
            system_status: take(Resource::SystemStatus),
            operation: take(Resource::Operation),
            solar: take(Resource::Solar),
        })
    }

    /// Returns the raw body of a resource.
    #[must_use]
    pub fn raw(&self, resource: Resource) -> &Value {
        match resource {
            Resource::Networks => &self.networks,
            Resource::Status => &self.status,
            Resource::Powerwalls => &self.powerwalls,
            Resource::Powerflow => &self.powerflow,
            Resource::SystemStatus => &self.system_status,
            Resource::Operation => &self.operation,
            Resource::Solar => &self.solar,
        }
    }

    /// Decodes the gateway identity.
    ///
    /// # Errors
    ///
    /// Returns error if `din` or `version` is missing.
    pub fn gateway_status(&self) -> Result<GatewayStatus, ParseError> {
        let status = self.raw(Resource::Status);
        for field in ["din", "version"] {
            if !status.get(field).is_some_and(Value::is_string) {
                return Err(ParseError::MissingField(format!("status.{field}")));
            }
        }
        decode(status)
    }

    /// Decodes the network interface list.
    ///
    /// # Errors
    ///
    /// Returns error if the body is neither a list nor an empty object.
    pub fn networks(&self) -> Result<Vec<NetworkInterface>, ParseError> {
        match self.raw(Resource::Networks) {
            Value::Array(_) => decode(self.raw(Resource::Networks)),
            Value::Object(map) if map.is_empty() => Ok(Vec::new()),
            other => Err(ParseError::UnexpectedFormat(format!(
                "networks: expected a list, got {other}"
            ))),
        }
    }

    /// Decodes the system status totals and battery blocks.
    ///
    /// # Errors
    ///
    /// Returns error if a battery block lacks its serial number.
    pub fn system_status(&self) -> Result<SystemStatus, ParseError> {
        decode(self.raw(Resource::SystemStatus))
    }

    /// Decodes the meter aggregates.
    ///
    /// # Errors
    ///
    /// Returns error if the body has an unexpected shape.
    pub fn powerflow(&self) -> Result<Powerflow, ParseError> {
        decode(self.raw(Resource::Powerflow))
    }

    /// Decodes the operation settings.
    ///
    /// # Errors
    ///
    /// Returns error if the body has an unexpected shape.
    pub fn operation(&self) -> Result<Operation, ParseError> {
        decode(self.raw(Resource::Operation))
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ParseError> {
    T::deserialize(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_parts() -> HashMap<Resource, Value> {
        Resource::ALL
            .into_iter()
            .map(|resource| (resource, json!({})))
            .collect()
    }

    #[test]
    fn complete_parts_build_bundle() {
        let bundle = RawResourceBundle::from_parts(complete_parts()).unwrap();
        assert_eq!(bundle.raw(Resource::Solar), &json!({}));
    }

    #[test]
    fn each_missing_resource_is_reported() {
        for resource in Resource::ALL {
            let mut parts = complete_parts();
            parts.remove(&resource);
            let missing = RawResourceBundle::from_parts(parts).unwrap_err();
            assert_eq!(missing, vec![resource]);
        }
    }

    #[test]
    fn empty_status_is_missing_din() {
        let bundle = RawResourceBundle::from_parts(complete_parts()).unwrap();
        let err = bundle.gateway_status().unwrap_err();
        assert!(matches!(err, ParseError::MissingField(field) if field == "status.din"));
    }

    #[test]
    fn empty_networks_object_is_empty_list() {
        let bundle = RawResourceBundle::from_parts(complete_parts()).unwrap();
        assert!(bundle.networks().unwrap().is_empty());
    }

    #[test]
    fn networks_of_wrong_shape_fail() {
        let mut parts = complete_parts();
        parts.insert(Resource::Networks, json!("offline"));
        let bundle = RawResourceBundle::from_parts(parts).unwrap();
        assert!(matches!(
            bundle.networks(),
            Err(ParseError::UnexpectedFormat(_))
        ));
    }
}
