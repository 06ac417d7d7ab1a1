// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bundle to snapshot conversion.

use crate::error::ParseError;
use crate::manager::DeviceOverrides;
use crate::response::{BatteryBlock, RawResourceBundle};

use super::model::{
    battery_model, gateway_model, gateway_serial, sanitize_name, software_version,
};
use super::snapshot::{DeviceSnapshot, DeviceType, MANUFACTURER};

fn description(model: &str) -> String {
    sanitize_name(&format!("{MANUFACTURER} {model}"))
}

/// Converts a complete bundle into device snapshots.
///
/// The gateway comes first, followed by one snapshot per battery block in
/// gateway order.
///
/// # Errors
///
/// Returns error if the gateway identity is missing or a resource has an
/// unexpected shape.
pub fn normalize(
    bundle: &RawResourceBundle,
    overrides: &DeviceOverrides,
) -> Result<Vec<DeviceSnapshot>, ParseError> {
    let status = bundle.gateway_status()?;
    let networks = bundle.networks()?;
    let system = bundle.system_status()?;
    let operation = bundle.operation()?;
    let powerflow = bundle.powerflow()?;

    let version = software_version(&status.version);
    let reserve = operation.backup_reserve_percent;

    let serial = gateway_serial(&status.din);
    let model = gateway_model(&status.din);
    let mut snapshots = Vec::with_capacity(system.battery_blocks.len() + 1);
    snapshots.push(DeviceSnapshot {
        device_type: DeviceType::Gateway,
        model: model.to_string(),
        description: description(model),
        manufacturer: MANUFACTURER.to_string(),
        software_version: version.clone(),
        online: networks.iter().any(|network| network.is_up()),
        excluded: overrides.is_excluded(&serial),
        backup_reserve_percent: reserve,
        energy_remaining: system.nominal_energy_remaining,
        full_capacity: system.nominal_full_pack_energy,
        power_out: 0.0,
        voltage_out: 0.0,
        current_out: 0.0,
        powerflow: Some(powerflow),
        history_enabled: overrides.history_enabled(&serial),
        serial_number: serial,
    });

    snapshots.extend(
        system
            .battery_blocks
            .iter()
            .map(|block| battery_snapshot(block, &version, reserve, overrides)),
    );

    Ok(snapshots)
}

fn battery_snapshot(
    block: &BatteryBlock,
    version: &str,
    reserve: f64,
    overrides: &DeviceOverrides,
) -> DeviceSnapshot {
    let serial = block.package_serial_number.to_uppercase();
    let model = battery_model(&block.package_part_number);
    DeviceSnapshot {
        device_type: DeviceType::Battery,
        model: model.to_string(),
        description: description(model),
        manufacturer: MANUFACTURER.to_string(),
        software_version: version.to_string(),
        online: block.op_seq_state.eq_ignore_ascii_case("ACTIVE"),
        excluded: false,
        backup_reserve_percent: reserve,
        energy_remaining: block.nominal_energy_remaining,
        full_capacity: block.nominal_full_pack_energy,
        power_out: block.p_out,
        voltage_out: block.v_out,
        current_out: -block.i_out,
        powerflow: None,
        history_enabled: overrides.history_enabled(&serial),
        serial_number: serial,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::{Value, json};

    use super::*;
    use crate::manager::DeviceOptions;
    use crate::protocol::Resource;

    fn bundle_with(status: Value, networks: Value, system_status: Value) -> RawResourceBundle {
        let mut parts: HashMap<Resource, Value> = Resource::ALL
            .into_iter()
            .map(|resource| (resource, json!({})))
            .collect();
        parts.insert(Resource::Status, status);
        parts.insert(Resource::Networks, networks);
        parts.insert(Resource::SystemStatus, system_status);
        parts.insert(Resource::Operation, json!({"backup_reserve_percent": 20.0}));
        parts.insert(
            Resource::Powerflow,
            json!({"battery": {"instant_power": 250.0}, "solar": {"instant_power": 1800.0}}),
        );
        RawResourceBundle::from_parts(parts).unwrap()
    }

    fn sample_bundle() -> RawResourceBundle {
        bundle_with(
            json!({"din": "1118431--abc123", "version": "23.44.0 eb113390"}),
            json!([
                {"network_name": "ethernet_tesla_internal_default", "enabled": true, "active": false},
                {"network_name": "wifi_home", "enabled": true, "active": true}
            ]),
            json!({
                "nominal_full_pack_energy": 27000.0,
                "nominal_energy_remaining": 13500.0,
                "battery_blocks": [{
                    "PackagePartNumber": "3012170-05-C",
                    "PackageSerialNumber": "tg1220000000ab",
                    "OpSeqState": "Active",
                    "nominal_energy_remaining": 6750.0,
                    "nominal_full_pack_energy": 13500.0,
                    "p_out": -1500.0,
                    "v_out": 244.0,
                    "i_out": 6.1
                }]
            }),
        )
    }

    fn overrides() -> DeviceOverrides {
        DeviceOverrides::new(false, HashMap::new())
    }

    #[test]
    fn gateway_snapshot() {
        let snapshots = normalize(&sample_bundle(), &overrides()).unwrap();
        let gateway = &snapshots[0];

        assert!(gateway.is_gateway());
        assert_eq!(gateway.serial_number, "ABC123");
        assert_eq!(gateway.model, "Backup Gateway 1");
        assert_eq!(gateway.description, "Tesla Backup Gateway 1");
        assert_eq!(gateway.manufacturer, "Tesla");
        assert_eq!(gateway.software_version, "23.44.0");
        assert!(gateway.online);
        assert!(!gateway.excluded);
        assert!((gateway.backup_reserve_percent - 20.0).abs() < f64::EPSILON);
        assert!((gateway.full_capacity - 27000.0).abs() < f64::EPSILON);
        assert!(gateway.powerflow.as_ref().unwrap().battery.is_some());
    }

    #[test]
    fn battery_snapshot_fields() {
        let snapshots = normalize(&sample_bundle(), &overrides()).unwrap();
        assert_eq!(snapshots.len(), 2);
        let battery = &snapshots[1];

        assert!(battery.is_battery());
        assert_eq!(battery.serial_number, "TG1220000000AB");
        assert_eq!(battery.model, "Powerwall 2 AC");
        assert_eq!(battery.software_version, "23.44.0");
        assert!(battery.online);
        assert!((battery.current_out + 6.1).abs() < f64::EPSILON);
        assert!((battery.power_out + 1500.0).abs() < f64::EPSILON);
        assert!(battery.powerflow.is_none());
    }

    #[test]
    fn offline_without_active_network() {
        let bundle = bundle_with(
            json!({"din": "1099752--X", "version": "1"}),
            json!([{"enabled": true, "active": false}, {"enabled": false, "active": true}]),
            json!({}),
        );
        let snapshots = normalize(&bundle, &overrides()).unwrap();
        assert!(!snapshots[0].online);
        assert_eq!(snapshots.len(), 1);
    }

    #[test]
    fn battery_not_active_is_offline() {
        let bundle = bundle_with(
            json!({"din": "1099752--X", "version": "1"}),
            json!([]),
            json!({"battery_blocks": [{"PackageSerialNumber": "B1", "OpSeqState": "Standby"}]}),
        );
        let snapshots = normalize(&bundle, &overrides()).unwrap();
        assert!(!snapshots[1].online);
        assert_eq!(snapshots[1].model, "Powerwall");
    }

    #[test]
    fn exclusion_applies_to_gateway_only() {
        let overrides = overrides();
        overrides.set_excluded("ABC123", true);
        overrides.set_excluded("TG1220000000AB", true);

        let snapshots = normalize(&sample_bundle(), &overrides).unwrap();
        assert!(snapshots[0].excluded);
        assert!(!snapshots[1].excluded);
    }

    #[test]
    fn history_flag_uses_override() {
        let overrides = DeviceOverrides::new(
            false,
            HashMap::from([(
                "tg1220000000ab".to_string(),
                DeviceOptions {
                    exclude: false,
                    eve_history: true,
                },
            )]),
        );

        let snapshots = normalize(&sample_bundle(), &overrides).unwrap();
        assert!(!snapshots[0].history_enabled);
        assert!(snapshots[1].history_enabled);

        let global = DeviceOverrides::new(true, HashMap::new());
        let snapshots = normalize(&sample_bundle(), &global).unwrap();
        assert!(snapshots.iter().all(|snapshot| snapshot.history_enabled));
    }

    #[test]
    fn missing_din_fails() {
        let bundle = bundle_with(json!({"version": "1"}), json!([]), json!({}));
        assert!(matches!(
            normalize(&bundle, &overrides()),
            Err(ParseError::MissingField(_))
        ));
    }

    #[test]
    fn battery_without_serial_fails() {
        let bundle = bundle_with(
            json!({"din": "1--X", "version": "1"}),
            json!([]),
            json!({"battery_blocks": [{"OpSeqState": "Active"}]}),
        );
        assert!(normalize(&bundle, &overrides()).is_err());
    }
}
