// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared fixtures: a mock gateway and a recording accessory sink.

#![allow(dead_code)]

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::Mutex;
use powerwall_bridge::event::{AccessoryId, PlatformEvent};
use powerwall_bridge::sink::{AccessoryRequest, AccessorySink};
use powerwall_bridge::state::AccessoryUpdate;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "token-abc==";
pub const GATEWAY_DIN: &str = "1232100-00-E--TG1234567890AB";
pub const GATEWAY_SERIAL: &str = "TG1234567890AB";
pub const BATTERY_SERIAL: &str = "TG1220000000CD";

pub fn networks() -> Value {
    json!([
        {"network_name": "ethernet_tesla_internal_default", "enabled": true, "active": false},
        {"network_name": "wifi_home", "enabled": true, "active": true}
    ])
}

pub fn status() -> Value {
    json!({"din": GATEWAY_DIN, "version": "23.44.0 eb113390", "device_type": "teg"})
}

pub fn powerwalls() -> Value {
    json!({"enumerating": false, "powerwalls": [{"PackageSerialNumber": BATTERY_SERIAL}]})
}

pub fn aggregates() -> Value {
    json!({
        "site": {"instant_power": -12.0},
        "battery": {"instant_power": 1250.0, "instant_average_voltage": 243.1},
        "load": {"instant_power": 1700.0},
        "solar": {"instant_power": 460.0}
    })
}

pub fn system_status() -> Value {
    json!({
        "nominal_full_pack_energy": 13500.0,
        "nominal_energy_remaining": 6750.0,
        "battery_blocks": [{
            "PackagePartNumber": "3012170-05-C",
            "PackageSerialNumber": BATTERY_SERIAL.to_lowercase(),
            "OpSeqState": "Active",
            "nominal_energy_remaining": 6750.0,
            "nominal_full_pack_energy": 13500.0,
            "p_out": 1250.0,
            "v_out": 243.1,
            "i_out": -5.1
        }]
    })
}

pub fn operation() -> Value {
    json!({"real_mode": "self_consumption", "backup_reserve_percent": 20.0})
}

pub fn solars() -> Value {
    json!([{"brand": "Generic", "model": "Inverter", "power_rating_watts": 5000}])
}

/// All seven data resources with their sample bodies.
pub fn resources() -> Vec<(&'static str, Value)> {
    vec![
        ("/api/networks", networks()),
        ("/api/status", status()),
        ("/api/powerwalls", powerwalls()),
        ("/api/meters/aggregates", aggregates()),
        ("/api/system_status", system_status()),
        ("/api/operation", operation()),
        ("/api/solars", solars()),
    ]
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/login/Basic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "me@example.com",
            "firstname": "Tesla",
            "token": TOKEN,
            "roles": ["Home_Owner"]
        })))
        .mount(server)
        .await;
}

/// Mounts every data resource except those listed in `skip`.
pub async fn mount_resources_except(server: &MockServer, skip: &[&str]) {
    for (resource, body) in resources() {
        if skip.contains(&resource) {
            continue;
        }
        Mock::given(method("GET"))
            .and(path(resource))
            .and(header("cookie", format!("AuthCookie={TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

/// Starts a mock gateway answering login and all data resources.
pub async fn mock_gateway() -> MockServer {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_resources_except(&server, &[]).await;
    server
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Register(AccessoryRequest),
    Unregister(AccessoryId),
    Update(AccessoryId, AccessoryUpdate),
}

/// Sink that records every call.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<Call>>,
    registered: Mutex<HashSet<AccessoryId>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn updates_for(&self, id: AccessoryId) -> Vec<AccessoryUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update(target, update) if target == id => Some(update),
                _ => None,
            })
            .collect()
    }

    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Update(..)))
            .count()
    }

    pub fn unregister_count(&self, id: AccessoryId) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == Call::Unregister(id))
            .count()
    }

    pub fn preload(&self, id: AccessoryId) {
        self.registered.lock().insert(id);
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl AccessorySink for RecordingSink {
    fn register(&self, request: AccessoryRequest) {
        self.registered.lock().insert(request.accessory_id);
        self.calls.lock().push(Call::Register(request));
    }

    fn is_registered(&self, id: AccessoryId) -> bool {
        self.registered.lock().contains(&id)
    }

    fn unregister(&self, id: AccessoryId) {
        self.registered.lock().remove(&id);
        self.calls.lock().push(Call::Unregister(id));
    }

    fn update(&self, id: AccessoryId, update: AccessoryUpdate) {
        self.calls.lock().push(Call::Update(id, update));
    }
}

/// Waits for the first event matching `predicate`.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<PlatformEvent>, mut predicate: F) -> PlatformEvent
where
    F: FnMut(&PlatformEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
