use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use firefleet_core::model::{Fault, FaultType, NewFault, NewFaultType, NewVehicle, Vehicle};
use firefleet_core::stats::{dashboard_stats, top_fault_types, top_vehicle_groups};
use firefleet_core::{StationId, UserId};

const VEHICLE_TYPES: [&str; 4] = ["tanker", "ladder", "rescue", "ambulance"];

fn fleet(size: usize) -> Vec<Vehicle> {
    let station_id = StationId::new();
    (0..size)
        .map(|i| {
            NewVehicle {
                plate: format!("06 FF {i:04}"),
                brand: "Mercedes".into(),
                model: "Atego".into(),
                year: 2020,
                vehicle_type: Some(VEHICLE_TYPES[i % VEHICLE_TYPES.len()].into()),
                station_id,
                status: None,
                insurance_expiry: Some(format!("2026-{:02}-15", i % 12 + 1)),
                inspection_expiry: None,
                kasko_expiry: None,
                assigned_driver_id: None,
                current_km: Some(40_000 + i as u64 * 100),
                last_oil_change_date: None,
                last_oil_change_km: None,
                next_oil_change_date: None,
                next_oil_change_km: Some(50_000),
                equipment: Vec::new(),
                notes: None,
            }
            .into_vehicle(Utc::now())
        })
        .collect()
}

fn fault_types() -> Vec<FaultType> {
    ["Engine", "Brakes", "Electrical", "Pump", "Tyres", "Ladder"]
        .iter()
        .map(|name| {
            NewFaultType {
                name: (*name).into(),
                description: None,
            }
            .into_fault_type(Utc::now())
        })
        .collect()
}

fn faults(count: usize, vehicles: &[Vehicle], types: &[FaultType]) -> Vec<Fault> {
    let reporter = UserId::new();
    (0..count)
        .map(|i| {
            NewFault {
                vehicle_id: vehicles[i % vehicles.len()].id,
                fault_type_id: (i % 7 != 0).then(|| types[i % types.len()].id),
                description: "bench".into(),
                priority: None,
                service_id: None,
            }
            .into_fault(reporter, Utc::now())
        })
        .collect()
}

fn bench_fault_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("fault_statistics");
    let vehicles = fleet(200);
    let types = fault_types();

    for fault_count in [100usize, 1_000, 10_000].iter() {
        let faults = faults(*fault_count, &vehicles, &types);
        group.throughput(Throughput::Elements(*fault_count as u64));

        group.bench_with_input(BenchmarkId::new("top_fault_types", fault_count), &faults, |b, faults| {
            b.iter(|| top_fault_types(black_box(faults), black_box(&types), 10))
        });
        group.bench_with_input(BenchmarkId::new("top_vehicle_groups", fault_count), &faults, |b, faults| {
            b.iter(|| top_vehicle_groups(black_box(faults), black_box(&vehicles), 10))
        });
    }

    group.finish();
}

fn bench_dashboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard");
    let types = fault_types();

    for fleet_size in [50usize, 500].iter() {
        let vehicles = fleet(*fleet_size);
        let faults = faults(fleet_size * 4, &vehicles, &types);
        group.bench_with_input(BenchmarkId::new("dashboard_stats", fleet_size), &vehicles, |b, vehicles| {
            b.iter(|| dashboard_stats(black_box(vehicles), black_box(&faults), 4, 24, Utc::now()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fault_statistics, bench_dashboard);
criterion_main!(benches);
