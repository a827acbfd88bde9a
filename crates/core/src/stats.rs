//! Dashboard counters and fault statistics.
//!
//! All aggregation happens in memory over records already loaded from the
//! store; every function is a single pass with a `HashMap` accumulator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{FaultTypeId, VehicleId};
use crate::model::{Fault, FaultStatus, FaultType, Vehicle, VehicleStatus};

/// Label used for faults reported without a fault type.
pub const UNSPECIFIED_FAULT_TYPE: &str = "Unspecified";
/// Label used for faults whose vehicle is gone or has no type.
pub const UNKNOWN_VEHICLE_GROUP: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_vehicles: usize,
    pub active_vehicles: usize,
    pub faulty_vehicles: usize,
    pub accident_vehicles: usize,
    pub pending_faults: usize,
    pub expiring_soon: usize,
    pub oil_change_due: usize,
    pub total_stations: usize,
    pub total_drivers: usize,
}

/// Compute dashboard counters. `vehicles` is expected to be pre-scoped to
/// what the caller may see; `faults` feed the fleet-wide pending count.
pub fn dashboard_stats(
    vehicles: &[Vehicle],
    faults: &[Fault],
    total_stations: usize,
    total_drivers: usize,
    now: DateTime<Utc>,
) -> DashboardStats {
    let mut stats = DashboardStats {
        total_vehicles: vehicles.len(),
        total_stations,
        total_drivers,
        ..Default::default()
    };

    for vehicle in vehicles {
        match vehicle.status {
            VehicleStatus::Active => stats.active_vehicles += 1,
            VehicleStatus::Faulty => stats.faulty_vehicles += 1,
            VehicleStatus::Accident => stats.accident_vehicles += 1,
        }
        if vehicle.is_expiring_soon(now) {
            stats.expiring_soon += 1;
        }
        if vehicle.oil_change_due(now) {
            stats.oil_change_due += 1;
        }
    }

    stats.pending_faults = faults
        .iter()
        .filter(|f| f.status == FaultStatus::Pending)
        .count();
    stats
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultTypeCount {
    pub fault_type_id: Option<FaultTypeId>,
    pub fault_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleGroupCount {
    pub vehicle_type: String,
    pub count: usize,
}

/// Most frequently reported fault types, highest count first (ties by name).
///
/// Faults pointing at a deleted fault type are grouped with the untyped ones.
pub fn top_fault_types(faults: &[Fault], fault_types: &[FaultType], limit: usize) -> Vec<FaultTypeCount> {
    let names: HashMap<FaultTypeId, &str> =
        fault_types.iter().map(|t| (t.id, t.name.as_str())).collect();

    let mut counts: HashMap<Option<FaultTypeId>, usize> = HashMap::new();
    for fault in faults {
        let key = fault.fault_type_id.filter(|id| names.contains_key(id));
        *counts.entry(key).or_default() += 1;
    }

    let mut rows: Vec<FaultTypeCount> = counts
        .into_iter()
        .map(|(id, count)| FaultTypeCount {
            fault_type_id: id,
            fault_type: id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNSPECIFIED_FAULT_TYPE)
                .to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.fault_type.cmp(&b.fault_type)));
    rows.truncate(limit);
    rows
}

/// Fault counts grouped by the reported vehicle's `vehicle_type`.
pub fn top_vehicle_groups(faults: &[Fault], vehicles: &[Vehicle], limit: usize) -> Vec<VehicleGroupCount> {
    let groups: HashMap<VehicleId, &str> = vehicles
        .iter()
        .filter_map(|v| v.vehicle_type.as_deref().map(|t| (v.id, t)))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for fault in faults {
        let group = groups
            .get(&fault.vehicle_id)
            .copied()
            .unwrap_or(UNKNOWN_VEHICLE_GROUP);
        *counts.entry(group).or_default() += 1;
    }

    let mut rows: Vec<VehicleGroupCount> = counts
        .into_iter()
        .map(|(group, count)| VehicleGroupCount {
            vehicle_type: group.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.vehicle_type.cmp(&b.vehicle_type)));
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{StationId, UserId};
    use crate::model::{NewFault, NewFaultType, NewVehicle};
    use proptest::prelude::*;

    fn vehicle(vehicle_type: Option<&str>) -> Vehicle {
        NewVehicle {
            plate: "06 AA 1".into(),
            brand: "Ford".into(),
            model: "Cargo".into(),
            year: 2019,
            vehicle_type: vehicle_type.map(str::to_string),
            station_id: StationId::new(),
            status: None,
            insurance_expiry: None,
            inspection_expiry: None,
            kasko_expiry: None,
            assigned_driver_id: None,
            current_km: None,
            last_oil_change_date: None,
            last_oil_change_km: None,
            next_oil_change_date: None,
            next_oil_change_km: None,
            equipment: Vec::new(),
            notes: None,
        }
        .into_vehicle(Utc::now())
    }

    fn fault(vehicle_id: VehicleId, fault_type_id: Option<FaultTypeId>) -> Fault {
        NewFault {
            vehicle_id,
            fault_type_id,
            description: "x".into(),
            priority: None,
            service_id: None,
        }
        .into_fault(UserId::new(), Utc::now())
    }

    fn fault_type(name: &str) -> FaultType {
        NewFaultType {
            name: name.into(),
            description: None,
        }
        .into_fault_type(Utc::now())
    }

    #[test]
    fn top_fault_types_orders_by_count_then_name() {
        let engine = fault_type("Engine");
        let brakes = fault_type("Brakes");
        let v = VehicleId::new();
        let faults = vec![
            fault(v, Some(engine.id)),
            fault(v, Some(brakes.id)),
            fault(v, Some(engine.id)),
            fault(v, Some(brakes.id)),
            fault(v, None),
        ];
        let rows = top_fault_types(&faults, &[engine.clone(), brakes.clone()], 10);
        let names: Vec<_> = rows.iter().map(|r| r.fault_type.as_str()).collect();
        assert_eq!(names, vec!["Brakes", "Engine", UNSPECIFIED_FAULT_TYPE]);
        assert_eq!(rows[0].count, 2);

        assert_eq!(top_fault_types(&faults, &[engine, brakes], 1).len(), 1);
    }

    #[test]
    fn vehicle_groups_fall_back_to_unknown() {
        let tanker = vehicle(Some("tanker"));
        let untyped = vehicle(None);
        let faults = vec![
            fault(tanker.id, None),
            fault(tanker.id, None),
            fault(untyped.id, None),
            fault(VehicleId::new(), None),
        ];
        let rows = top_vehicle_groups(&faults, &[tanker, untyped], 10);
        assert_eq!(rows[0].vehicle_type, UNKNOWN_VEHICLE_GROUP);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].vehicle_type, "tanker");
    }

    #[test]
    fn dashboard_counts_status_and_pending() {
        let mut faulty = vehicle(None);
        faulty.status = VehicleStatus::Faulty;
        faulty.insurance_expiry = Some("2000-01-01".into());
        let vehicles = vec![vehicle(None), faulty.clone()];
        let mut resolved = fault(faulty.id, None);
        resolved.status = FaultStatus::Resolved;
        let faults = vec![fault(faulty.id, None), resolved];

        let stats = dashboard_stats(&vehicles, &faults, 4, 6, Utc::now());
        assert_eq!(stats.total_vehicles, 2);
        assert_eq!(stats.active_vehicles, 1);
        assert_eq!(stats.faulty_vehicles, 1);
        assert_eq!(stats.pending_faults, 1);
        assert_eq!(stats.expiring_soon, 1);
        assert_eq!(stats.total_stations, 4);
        assert_eq!(stats.total_drivers, 6);
    }

    proptest! {
        #[test]
        fn statistics_counts_sum_to_fault_total(assignments in proptest::collection::vec((0usize..4, 0usize..4), 0..64)) {
            let types: Vec<FaultType> = ["A", "B", "C"].iter().map(|n| fault_type(n)).collect();
            let vehicles: Vec<Vehicle> = [Some("tanker"), Some("ladder"), None]
                .iter()
                .map(|t| vehicle(*t))
                .collect();

            let faults: Vec<Fault> = assignments
                .iter()
                .map(|(v, t)| {
                    let vehicle_id = vehicles.get(*v).map(|v| v.id).unwrap_or_default();
                    fault(vehicle_id, types.get(*t).map(|t| t.id))
                })
                .collect();

            let by_type: usize = top_fault_types(&faults, &types, usize::MAX).iter().map(|r| r.count).sum();
            let by_group: usize = top_vehicle_groups(&faults, &vehicles, usize::MAX).iter().map(|r| r.count).sum();
            prop_assert_eq!(by_type, faults.len());
            prop_assert_eq!(by_group, faults.len());
        }
    }
}
