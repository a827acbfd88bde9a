//! Demo data for local development and demos.
//!
//! [`seed_demo_data`] wipes every collection and loads a small Ankara fleet:
//! two managers (`amir1@itfaiye.gov.tr`, `amir2@itfaiye.gov.tr`, password
//! `amir123`) and six drivers (password `surucu123`).

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use firefleet_auth::{PasswordError, hash_password};
use firefleet_core::DomainError;
use firefleet_core::model::{
    Assignment, Fault, FaultStatus, FaultType, NewAssignment, NewEquipment, NewFault,
    NewFaultType, NewNotification, NewService, NewStation, NewUser, NewVehicle, NotificationKind,
    Priority, Role, Service, Station, User, Vehicle, VehicleStatus,
};
use firefleet_store::StoreError;

use crate::app::services::AppServices;

pub const MANAGER_PASSWORD: &str = "amir123";
pub const DRIVER_PASSWORD: &str = "surucu123";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("invalid seed record: {0}")]
    Domain(#[from] DomainError),
}

/// Record counts written by [`seed_demo_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub managers: usize,
    pub drivers: usize,
    pub stations: usize,
    pub vehicles: usize,
    pub services: usize,
    pub fault_types: usize,
    pub faults: usize,
    pub assignments: usize,
    pub notifications: usize,
}

struct StationSeed {
    name: &'static str,
    address: &'static str,
    phone: &'static str,
    internal_number: &'static str,
    latitude: f64,
    longitude: f64,
    manager: usize,
}

const STATIONS: [StationSeed; 4] = [
    StationSeed {
        name: "Ankara İtfaiye Merkez İstasyonu",
        address: "Ulus, Ankara",
        phone: "+90 312 123 4567",
        internal_number: "1001",
        latitude: 39.9334,
        longitude: 32.8597,
        manager: 0,
    },
    StationSeed {
        name: "Çankaya İtfaiye İstasyonu",
        address: "Çankaya, Ankara",
        phone: "+90 312 234 5678",
        internal_number: "1002",
        latitude: 39.9180,
        longitude: 32.8628,
        manager: 0,
    },
    StationSeed {
        name: "Keçiören İtfaiye İstasyonu",
        address: "Keçiören, Ankara",
        phone: "+90 312 345 6789",
        internal_number: "1003",
        latitude: 39.9696,
        longitude: 32.8629,
        manager: 1,
    },
    StationSeed {
        name: "Yenimahalle İtfaiye İstasyonu",
        address: "Yenimahalle, Ankara",
        phone: "+90 312 456 7890",
        internal_number: "1004",
        latitude: 39.9489,
        longitude: 32.7960,
        manager: 1,
    },
];

/// (email, name, phone)
const MANAGERS: [(&str, &str, &str); 2] = [
    ("amir1@itfaiye.gov.tr", "Ahmet Yılmaz", "+90 532 111 2233"),
    ("amir2@itfaiye.gov.tr", "Mehmet Demir", "+90 532 222 3344"),
];

/// (email, name, station, sicil no)
const DRIVERS: [(&str, &str, usize, &str); 6] = [
    ("ali.kaya@itfaiye.gov.tr", "Ali Kaya", 0, "2024001"),
    ("veli.ozturk@itfaiye.gov.tr", "Veli Öztürk", 0, "2024002"),
    ("hasan.celik@itfaiye.gov.tr", "Hasan Çelik", 1, "2024003"),
    ("huseyin.arslan@itfaiye.gov.tr", "Hüseyin Arslan", 1, "2024004"),
    ("mustafa.yilmaz@itfaiye.gov.tr", "Mustafa Yılmaz", 2, "2024005"),
    ("ismail.sahin@itfaiye.gov.tr", "İsmail Şahin", 3, "2024006"),
];

struct VehicleSeed {
    plate: &'static str,
    brand: &'static str,
    model: &'static str,
    year: i32,
    vehicle_type: &'static str,
    station: usize,
    status: VehicleStatus,
    /// Days from today until insurance, inspection and kasko expire.
    expiry_days: [i64; 3],
    driver: Option<usize>,
    km: u64,
    last_oil_km: u64,
    equipment: &'static [(&'static str, &'static str, u32)],
    notes: &'static str,
}

const VEHICLES: [VehicleSeed; 8] = [
    VehicleSeed {
        plate: "06 AA 1001",
        brand: "Mercedes",
        model: "Atego 1529",
        year: 2020,
        vehicle_type: "tanker",
        station: 0,
        status: VehicleStatus::Faulty,
        expiry_days: [120, 90, 150],
        driver: Some(0),
        km: 45_000,
        last_oil_km: 43_000,
        equipment: &[
            ("Yangın Hortumu", "HRT-2024-001", 4),
            ("Yangın Söndürme Tüpü", "TUP-2024-001", 6),
        ],
        notes: "Düzenli bakımda",
    },
    VehicleSeed {
        plate: "06 AA 1002",
        brand: "MAN",
        model: "TGM 18.340",
        year: 2019,
        vehicle_type: "ladder",
        station: 0,
        status: VehicleStatus::Faulty,
        expiry_days: [200, 180, 220],
        driver: Some(1),
        km: 67_000,
        last_oil_km: 65_000,
        equipment: &[
            ("Hidrolik Merdiven", "MRD-2024-001", 1),
            ("Kurtarma İpi", "IP-2024-001", 2),
        ],
        notes: "30 metre merdiven kapasitesi",
    },
    VehicleSeed {
        plate: "06 BB 2001",
        brand: "Iveco",
        model: "Eurocargo 150E",
        year: 2021,
        vehicle_type: "tanker",
        station: 1,
        status: VehicleStatus::Faulty,
        expiry_days: [300, 280, 320],
        driver: Some(2),
        km: 32_000,
        last_oil_km: 30_000,
        equipment: &[
            ("Su Pompası", "PMP-2024-001", 1),
            ("Yangın Hortumu", "HRT-2024-002", 6),
        ],
        notes: "Motor arızası mevcut",
    },
    VehicleSeed {
        plate: "06 BB 2002",
        brand: "Ford",
        model: "Cargo 2530",
        year: 2018,
        vehicle_type: "rescue",
        station: 1,
        status: VehicleStatus::Active,
        expiry_days: [25, 45, 80],
        driver: Some(3),
        km: 89_000,
        last_oil_km: 87_000,
        equipment: &[
            ("Kurtarma Seti", "KRT-2024-001", 1),
            ("İlk Yardım Çantası", "ILK-2024-001", 2),
        ],
        notes: "Sigortası yakında dolacak",
    },
    VehicleSeed {
        plate: "06 CC 3001",
        brand: "Mercedes",
        model: "Sprinter 519",
        year: 2022,
        vehicle_type: "service",
        station: 2,
        status: VehicleStatus::Active,
        expiry_days: [350, 330, 365],
        driver: Some(4),
        km: 15_000,
        last_oil_km: 10_000,
        equipment: &[("Taşınabilir Söndürücü", "SND-2024-001", 4)],
        notes: "Yeni araç",
    },
    VehicleSeed {
        plate: "06 CC 3002",
        brand: "Volvo",
        model: "FL 240",
        year: 2020,
        vehicle_type: "snorkel",
        station: 2,
        status: VehicleStatus::Active,
        expiry_days: [210, 190, 230],
        driver: None,
        km: 54_000,
        last_oil_km: 52_000,
        equipment: &[("Hidrolik Platform", "PLT-2024-001", 1)],
        notes: "25 metre yükseklik kapasitesi",
    },
    VehicleSeed {
        plate: "06 DD 4001",
        brand: "Scania",
        model: "P320",
        year: 2017,
        vehicle_type: "tanker",
        station: 3,
        status: VehicleStatus::Active,
        expiry_days: [140, 20, 160],
        driver: Some(5),
        km: 112_000,
        last_oil_km: 110_000,
        equipment: &[
            ("Yangın Hortumu", "HRT-2024-003", 5),
            ("Su Tankı", "TNK-2024-001", 1),
        ],
        notes: "Yüksek kilometreli, yakında muayene",
    },
    VehicleSeed {
        plate: "06 DD 4002",
        brand: "MAN",
        model: "TGA 26.320",
        year: 2021,
        vehicle_type: "terrain",
        station: 3,
        status: VehicleStatus::Active,
        expiry_days: [270, 250, 290],
        driver: None,
        km: 28_000,
        last_oil_km: 25_000,
        equipment: &[("Arazi Ekipmanları", "ARZ-2024-001", 1)],
        notes: "Ormanlık alanlara müdahale için",
    },
];

/// (name, address, phone, email, specialization)
const SERVICES: [(&str, &str, &str, &str, &str); 3] = [
    (
        "Ankara Ağır Vasıta Servisi",
        "Sincan, Ankara",
        "+90 312 567 8901",
        "info@ankaraagirvasita.com",
        "Motor ve şanzıman",
    ),
    (
        "Mercedes Yetkili Servisi",
        "Macunköy, Ankara",
        "+90 312 678 9012",
        "servis@mercedes-ankara.com",
        "Mercedes araçlar",
    ),
    (
        "Hidrolik Sistem Tamiri",
        "Ostim, Ankara",
        "+90 312 789 0123",
        "info@hidroliksistem.com",
        "Hidrolik sistemler",
    ),
];

const FAULT_TYPES: [(&str, &str); 6] = [
    ("Motor Arızası", "Motor ile ilgili arızalar"),
    ("Şanzıman Arızası", "Vites ve şanzıman problemleri"),
    ("Fren Sistemi Arızası", "Fren sistemi ile ilgili sorunlar"),
    ("Elektrik Arızası", "Elektrik ve elektronik arızalar"),
    ("Hidrolik Sistem Arızası", "Hidrolik merdiven/platform arızaları"),
    ("Pompa Arızası", "Su pompası problemleri"),
];

struct FaultSeed {
    vehicle: usize,
    reporter: usize,
    fault_type: usize,
    description: &'static str,
    status: FaultStatus,
    priority: Priority,
    service: Option<usize>,
    resolution_notes: Option<&'static str>,
    days_ago: i64,
}

const FAULTS: [FaultSeed; 4] = [
    FaultSeed {
        vehicle: 2,
        reporter: 2,
        fault_type: 0,
        description: "Motor çalışırken anormal ses çıkarıyor. Güç kaybı var.",
        status: FaultStatus::InProgress,
        priority: Priority::High,
        service: Some(1),
        resolution_notes: None,
        days_ago: 3,
    },
    FaultSeed {
        vehicle: 3,
        reporter: 3,
        fault_type: 2,
        description: "Fren pedalında sertlik var. Kontrol edilmeli.",
        status: FaultStatus::Resolved,
        priority: Priority::High,
        service: Some(0),
        resolution_notes: Some("Fren balataları değiştirildi, hidrolik sistem kontrol edildi."),
        days_ago: 5,
    },
    FaultSeed {
        vehicle: 0,
        reporter: 0,
        fault_type: 3,
        description: "Ön farlar zaman zaman yanıp sönüyor.",
        status: FaultStatus::Pending,
        priority: Priority::Normal,
        service: None,
        resolution_notes: None,
        days_ago: 2,
    },
    FaultSeed {
        vehicle: 1,
        reporter: 1,
        fault_type: 4,
        description: "Hidrolik merdiven sistemi yavaş çalışıyor.",
        status: FaultStatus::Pending,
        priority: Priority::High,
        service: Some(2),
        resolution_notes: None,
        days_ago: 1,
    },
];

/// (vehicle, driver, manager, days ago, mission, location, notes)
const ASSIGNMENTS: [(usize, usize, usize, i64, &str, &str, &str); 3] = [
    (0, 0, 0, 10, "Yangın Söndürme", "Ulus, Ankara", "Konut yangını müdahalesi"),
    (1, 1, 0, 7, "Kurtarma", "Kızılay, Ankara", "Yüksek binada mahsur kalan kedi kurtarma"),
    (4, 4, 1, 0, "Rutin Devriye", "Keçiören, Ankara", "Günlük devriye görevi"),
];

/// Replace all stored data with the demo fleet.
pub async fn seed_demo_data(services: &AppServices) -> Result<SeedSummary, SeedError> {
    let db = &services.db;
    let now = Utc::now();
    db.clear_all().await?;
    tracing::info!("collections cleared");

    let mut summary = SeedSummary::default();

    let manager_hash = hash_password(MANAGER_PASSWORD)?;
    let mut managers: Vec<User> = Vec::new();
    for (email, name, phone) in MANAGERS {
        let user = new_user(email, name, Role::Manager, None, None, phone)
            .into_user(manager_hash.clone(), now);
        managers.push(db.users.insert(user).await?);
    }
    summary.managers = managers.len();

    let mut stations: Vec<Station> = Vec::new();
    for seed in &STATIONS {
        let station = NewStation {
            name: seed.name.into(),
            address: seed.address.into(),
            phone: seed.phone.into(),
            internal_number: Some(seed.internal_number.into()),
            latitude: Some(seed.latitude),
            longitude: Some(seed.longitude),
            manager_id: Some(managers[seed.manager].id),
        };
        station.validate()?;
        stations.push(db.stations.insert(station.into_station(now)).await?);
    }
    summary.stations = stations.len();

    let driver_hash = hash_password(DRIVER_PASSWORD)?;
    let mut drivers: Vec<User> = Vec::new();
    for (email, name, station, sicil_no) in DRIVERS {
        let phone = format!("+90 532 111 000{}", drivers.len() + 1);
        let user = new_user(
            email,
            name,
            Role::Driver,
            Some(&stations[station]),
            Some(sicil_no),
            &phone,
        )
        .into_user(driver_hash.clone(), now);
        drivers.push(db.users.insert(user).await?);
    }
    summary.drivers = drivers.len();

    let mut vehicles: Vec<Vehicle> = Vec::new();
    for seed in &VEHICLES {
        let vehicle = vehicle_input(seed, &stations, &drivers, now);
        vehicle.validate(now)?;
        vehicles.push(db.vehicles.insert(vehicle.into_vehicle(now)).await?);
    }
    summary.vehicles = vehicles.len();

    let mut repair_shops: Vec<Service> = Vec::new();
    for (name, address, phone, email, specialization) in SERVICES {
        let service = NewService {
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            email: Some(email.into()),
            specialization: Some(specialization.into()),
        };
        repair_shops.push(db.services.insert(service.into_service(now)).await?);
    }
    summary.services = repair_shops.len();

    let mut fault_types: Vec<FaultType> = Vec::new();
    for (name, description) in FAULT_TYPES {
        let fault_type = NewFaultType {
            name: name.into(),
            description: Some(description.into()),
        };
        fault_types.push(db.fault_types.insert(fault_type.into_fault_type(now)).await?);
    }
    summary.fault_types = fault_types.len();

    let mut faults: Vec<Fault> = Vec::new();
    for seed in &FAULTS {
        let reported_at = now - Duration::days(seed.days_ago);
        let mut fault = NewFault {
            vehicle_id: vehicles[seed.vehicle].id,
            fault_type_id: Some(fault_types[seed.fault_type].id),
            description: seed.description.into(),
            priority: Some(seed.priority),
            service_id: seed.service.map(|i| repair_shops[i].id),
        }
        .into_fault(drivers[seed.reporter].id, reported_at);
        fault.status = seed.status;
        fault.resolution_notes = seed.resolution_notes.map(String::from);
        if seed.status == FaultStatus::Resolved {
            fault.resolved_at = Some(now - Duration::days(1));
        }
        faults.push(db.faults.insert(fault).await?);
    }
    summary.faults = faults.len();

    let mut assignments: Vec<Assignment> = Vec::new();
    for (vehicle, driver, manager, days_ago, mission, location, notes) in ASSIGNMENTS {
        let start = now - Duration::days(days_ago);
        let assignment = NewAssignment {
            vehicle_id: vehicles[vehicle].id,
            driver_id: drivers[driver].id,
            start_date: start.to_rfc3339(),
            end_date: None,
            mission_type: mission.into(),
            location: location.into(),
            notes: Some(notes.into()),
        };
        assignment.validate()?;
        assignments.push(
            db.assignments
                .insert(assignment.into_assignment(managers[manager].id, start))
                .await?,
        );
    }
    summary.assignments = assignments.len();

    let announcements = [
        NewNotification::new(
            NotificationKind::Fault,
            "New fault reported",
            format!("Engine fault reported on {}", vehicles[2].plate),
        )
        .related(faults[0].id),
        NewNotification::new(
            NotificationKind::Fault,
            "Fault resolved",
            format!("Brake fault on {} has been fixed", vehicles[3].plate),
        )
        .related(faults[1].id),
    ];
    for manager in &managers {
        for announcement in &announcements {
            db.notifications.insert(announcement.to_user(manager.id, now)).await?;
            summary.notifications += 1;
        }
    }

    tracing::info!(?summary, "demo data seeded");
    Ok(summary)
}

fn new_user(
    email: &str,
    name: &str,
    role: Role,
    station: Option<&Station>,
    sicil_no: Option<&str>,
    phone: &str,
) -> NewUser {
    NewUser {
        email: email.into(),
        name: name.into(),
        role,
        station_id: station.map(|s| s.id),
        sicil_no: sicil_no.map(String::from),
        phone: Some(phone.into()),
    }
}

fn vehicle_input(
    seed: &VehicleSeed,
    stations: &[Station],
    drivers: &[User],
    now: DateTime<Utc>,
) -> NewVehicle {
    let expiry = |days: i64| Some((now + Duration::days(days)).to_rfc3339());
    let [insurance, inspection, kasko] = seed.expiry_days;

    NewVehicle {
        plate: seed.plate.into(),
        brand: seed.brand.into(),
        model: seed.model.into(),
        year: seed.year,
        vehicle_type: Some(seed.vehicle_type.into()),
        station_id: stations[seed.station].id,
        status: Some(seed.status),
        insurance_expiry: expiry(insurance),
        inspection_expiry: expiry(inspection),
        kasko_expiry: expiry(kasko),
        assigned_driver_id: seed.driver.map(|i| drivers[i].id),
        current_km: Some(seed.km),
        last_oil_change_date: None,
        last_oil_change_km: Some(seed.last_oil_km),
        next_oil_change_date: None,
        next_oil_change_km: Some(seed.last_oil_km + 10_000),
        equipment: seed
            .equipment
            .iter()
            .map(|(name, serial, quantity)| NewEquipment {
                name: (*name).into(),
                serial_number: Some((*serial).into()),
                quantity: Some(*quantity),
            })
            .collect(),
        notes: Some(seed.notes.into()),
    }
}
