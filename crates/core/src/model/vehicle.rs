use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{parse_optional, validate_date, validate_optional_date};
use crate::error::{DomainError, DomainResult, require_text};
use crate::id::{EquipmentId, RecordId, StationId, UserId, VehicleId, blank_as_none};

use super::{clean, string_enum};

/// Documents expiring within this many days count as "expiring soon".
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

string_enum!(
    VehicleStatus, "status" {
        Active => "active",
        Faulty => "faulty",
        Accident => "accident",
    }
);

string_enum!(
    /// Insurance-style documents a vehicle must keep current.
    VehicleDocument, "document" {
        Insurance => "insurance",
        Inspection => "inspection",
        Kasko => "kasko",
    }
);

string_enum!(
    MaintenanceKind, "kind" {
        OilChange => "oil_change",
        Inspection => "inspection",
        Repair => "repair",
        Other => "other",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: Option<String>,
    pub station_id: StationId,
    pub status: VehicleStatus,
    pub insurance_expiry: Option<String>,
    pub inspection_expiry: Option<String>,
    pub kasko_expiry: Option<String>,
    pub assigned_driver_id: Option<UserId>,
    pub current_km: Option<u64>,
    pub last_oil_change_date: Option<String>,
    pub last_oil_change_km: Option<u64>,
    pub next_oil_change_date: Option<String>,
    pub next_oil_change_km: Option<u64>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub accidents: Vec<AccidentRecord>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceRecord>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Vehicle, VehicleId, "vehicles");

/// A document expiring inside the warning window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringDocument {
    pub document: VehicleDocument,
    pub expires_at: String,
    pub expired: bool,
}

impl Vehicle {
    /// Canonical plate used for uniqueness checks ("06 aa 1001" == "06AA1001").
    pub fn plate_key(plate: &str) -> String {
        plate
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect()
    }

    fn documents(&self) -> [(VehicleDocument, Option<&str>); 3] {
        [
            (VehicleDocument::Insurance, self.insurance_expiry.as_deref()),
            (VehicleDocument::Inspection, self.inspection_expiry.as_deref()),
            (VehicleDocument::Kasko, self.kasko_expiry.as_deref()),
        ]
    }

    /// Documents expiring on or before `now + EXPIRY_WINDOW_DAYS`, including
    /// ones that have already lapsed.
    pub fn expiring_documents(&self, now: DateTime<Utc>) -> Vec<ExpiringDocument> {
        let horizon = now + Duration::days(EXPIRY_WINDOW_DAYS);
        self.documents()
            .into_iter()
            .filter_map(|(document, raw)| {
                let expires = parse_optional(raw)?;
                (expires <= horizon).then(|| ExpiringDocument {
                    document,
                    expires_at: raw.unwrap_or_default().to_string(),
                    expired: expires < now,
                })
            })
            .collect()
    }

    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        !self.expiring_documents(now).is_empty()
    }

    /// Oil change is due when the scheduled date falls inside the window or
    /// the odometer has passed the scheduled mileage.
    pub fn oil_change_due(&self, now: DateTime<Utc>) -> bool {
        let horizon = now + Duration::days(EXPIRY_WINDOW_DAYS);
        let by_date = parse_optional(self.next_oil_change_date.as_deref())
            .is_some_and(|due| due <= horizon);
        let by_km = matches!(
            (self.current_km, self.next_oil_change_km),
            (Some(current), Some(next)) if current >= next
        );
        by_date || by_km
    }

    pub fn add_equipment(&mut self, input: NewEquipment) -> DomainResult<Equipment> {
        input.validate()?;
        let item = input.into_equipment();
        self.equipment.push(item.clone());
        Ok(item)
    }

    pub fn remove_equipment(&mut self, equipment_id: EquipmentId) -> DomainResult<Equipment> {
        let pos = self
            .equipment
            .iter()
            .position(|e| e.id == equipment_id)
            .ok_or(DomainError::not_found("equipment"))?;
        Ok(self.equipment.remove(pos))
    }

    /// Append an accident record and flag the vehicle as damaged.
    pub fn record_accident(
        &mut self,
        input: NewAccident,
        recorded_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<AccidentRecord> {
        input.validate()?;
        let record = AccidentRecord {
            id: RecordId::new(),
            date: input.date.trim().to_string(),
            location: input.location.trim().to_string(),
            driver_id: input.driver_id,
            description: input.description.trim().to_string(),
            recorded_by,
            created_at: now,
        };
        self.accidents.push(record.clone());
        self.status = VehicleStatus::Accident;
        Ok(record)
    }

    /// Append a maintenance record and roll the schedule fields forward.
    pub fn record_maintenance(
        &mut self,
        input: NewMaintenance,
        recorded_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<MaintenanceRecord> {
        input.validate()?;
        let record = MaintenanceRecord {
            id: RecordId::new(),
            kind: input.kind,
            date: input.date.trim().to_string(),
            km: input.km,
            next_date: clean(input.next_date),
            next_km: input.next_km,
            notes: clean(input.notes),
            recorded_by,
            created_at: now,
        };

        if let Some(km) = record.km {
            self.current_km = Some(self.current_km.map_or(km, |current| current.max(km)));
        }
        match record.kind {
            MaintenanceKind::OilChange => {
                self.last_oil_change_date = Some(record.date.clone());
                if record.km.is_some() {
                    self.last_oil_change_km = record.km;
                }
                if record.next_date.is_some() {
                    self.next_oil_change_date = record.next_date.clone();
                }
                if record.next_km.is_some() {
                    self.next_oil_change_km = record.next_km;
                }
            }
            MaintenanceKind::Inspection => {
                if record.next_date.is_some() {
                    self.inspection_expiry = record.next_date.clone();
                }
            }
            MaintenanceKind::Repair | MaintenanceKind::Other => {}
        }

        self.maintenance.push(record.clone());
        Ok(record)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub serial_number: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEquipment {
    pub name: String,
    pub serial_number: Option<String>,
    pub quantity: Option<u32>,
}

impl NewEquipment {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("equipment name", &self.name)?;
        if self.quantity == Some(0) {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(())
    }

    fn into_equipment(self) -> Equipment {
        Equipment {
            id: EquipmentId::new(),
            name: self.name.trim().to_string(),
            serial_number: clean(self.serial_number),
            quantity: self.quantity.unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
    pub id: RecordId,
    pub date: String,
    pub location: String,
    pub driver_id: Option<UserId>,
    pub description: String,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccident {
    pub date: String,
    pub location: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub driver_id: Option<UserId>,
    pub description: String,
}

impl NewAccident {
    fn validate(&self) -> DomainResult<()> {
        validate_date("date", &self.date)?;
        require_text("location", &self.location)?;
        require_text("description", &self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: RecordId,
    pub kind: MaintenanceKind,
    pub date: String,
    pub km: Option<u64>,
    pub next_date: Option<String>,
    pub next_km: Option<u64>,
    pub notes: Option<String>,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaintenance {
    pub kind: MaintenanceKind,
    pub date: String,
    pub km: Option<u64>,
    pub next_date: Option<String>,
    pub next_km: Option<u64>,
    pub notes: Option<String>,
}

impl NewMaintenance {
    fn validate(&self) -> DomainResult<()> {
        validate_date("date", &self.date)?;
        validate_optional_date("next_date", self.next_date.as_deref())?;
        if let (Some(km), Some(next_km)) = (self.km, self.next_km) {
            if next_km < km {
                return Err(DomainError::validation("next_km must not be below km"));
            }
        }
        Ok(())
    }
}

/// Sort embedded records newest first by their `date`, then by creation time.
pub fn newest_first<T>(records: &mut [T], key: impl Fn(&T) -> (&str, DateTime<Utc>)) {
    records.sort_by(|a, b| {
        let (a_date, a_created) = key(a);
        let (b_date, b_created) = key(b);
        parse_optional(Some(b_date))
            .cmp(&parse_optional(Some(a_date)))
            .then(b_created.cmp(&a_created))
    });
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: Option<String>,
    pub station_id: StationId,
    pub status: Option<VehicleStatus>,
    pub insurance_expiry: Option<String>,
    pub inspection_expiry: Option<String>,
    pub kasko_expiry: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub assigned_driver_id: Option<UserId>,
    pub current_km: Option<u64>,
    pub last_oil_change_date: Option<String>,
    pub last_oil_change_km: Option<u64>,
    pub next_oil_change_date: Option<String>,
    pub next_oil_change_km: Option<u64>,
    #[serde(default)]
    pub equipment: Vec<NewEquipment>,
    pub notes: Option<String>,
}

impl NewVehicle {
    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<()> {
        require_text("plate", &self.plate)?;
        require_text("brand", &self.brand)?;
        require_text("model", &self.model)?;
        validate_year(self.year, now)?;
        validate_optional_date("insurance_expiry", self.insurance_expiry.as_deref())?;
        validate_optional_date("inspection_expiry", self.inspection_expiry.as_deref())?;
        validate_optional_date("kasko_expiry", self.kasko_expiry.as_deref())?;
        validate_optional_date("last_oil_change_date", self.last_oil_change_date.as_deref())?;
        validate_optional_date("next_oil_change_date", self.next_oil_change_date.as_deref())?;
        for item in &self.equipment {
            item.validate()?;
        }
        Ok(())
    }

    pub fn into_vehicle(self, now: DateTime<Utc>) -> Vehicle {
        Vehicle {
            id: VehicleId::new(),
            plate: self.plate.trim().to_string(),
            brand: self.brand.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year,
            vehicle_type: clean(self.vehicle_type),
            station_id: self.station_id,
            status: self.status.unwrap_or(VehicleStatus::Active),
            insurance_expiry: clean(self.insurance_expiry),
            inspection_expiry: clean(self.inspection_expiry),
            kasko_expiry: clean(self.kasko_expiry),
            assigned_driver_id: self.assigned_driver_id,
            current_km: self.current_km,
            last_oil_change_date: clean(self.last_oil_change_date),
            last_oil_change_km: self.last_oil_change_km,
            next_oil_change_date: clean(self.next_oil_change_date),
            next_oil_change_km: self.next_oil_change_km,
            equipment: self.equipment.into_iter().map(NewEquipment::into_equipment).collect(),
            accidents: Vec::new(),
            maintenance: Vec::new(),
            notes: clean(self.notes),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehiclePatch {
    pub plate: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vehicle_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub station_id: Option<StationId>,
    pub status: Option<VehicleStatus>,
    pub insurance_expiry: Option<String>,
    pub inspection_expiry: Option<String>,
    pub kasko_expiry: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub assigned_driver_id: Option<UserId>,
    pub current_km: Option<u64>,
    pub last_oil_change_date: Option<String>,
    pub last_oil_change_km: Option<u64>,
    pub next_oil_change_date: Option<String>,
    pub next_oil_change_km: Option<u64>,
    pub notes: Option<String>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.plate.is_none()
            && self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.vehicle_type.is_none()
            && self.station_id.is_none()
            && self.status.is_none()
            && self.insurance_expiry.is_none()
            && self.inspection_expiry.is_none()
            && self.kasko_expiry.is_none()
            && self.assigned_driver_id.is_none()
            && self.current_km.is_none()
            && self.last_oil_change_date.is_none()
            && self.last_oil_change_km.is_none()
            && self.next_oil_change_date.is_none()
            && self.next_oil_change_km.is_none()
            && self.notes.is_none()
    }

    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(plate) = &self.plate {
            require_text("plate", plate)?;
        }
        if let Some(brand) = &self.brand {
            require_text("brand", brand)?;
        }
        if let Some(model) = &self.model {
            require_text("model", model)?;
        }
        if let Some(year) = self.year {
            validate_year(year, now)?;
        }
        validate_optional_date("insurance_expiry", self.insurance_expiry.as_deref())?;
        validate_optional_date("inspection_expiry", self.inspection_expiry.as_deref())?;
        validate_optional_date("kasko_expiry", self.kasko_expiry.as_deref())?;
        validate_optional_date("last_oil_change_date", self.last_oil_change_date.as_deref())?;
        validate_optional_date("next_oil_change_date", self.next_oil_change_date.as_deref())
    }

    pub fn apply(&self, vehicle: &mut Vehicle) {
        fn set_text(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.trim().to_string();
            }
        }
        fn set_optional_text(target: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                *target = clean(value.clone());
            }
        }
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }
        fn set_optional<T: Copy>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set_text(&mut vehicle.plate, &self.plate);
        set_text(&mut vehicle.brand, &self.brand);
        set_text(&mut vehicle.model, &self.model);
        set(&mut vehicle.year, self.year);
        set_optional_text(&mut vehicle.vehicle_type, &self.vehicle_type);
        set(&mut vehicle.station_id, self.station_id);
        set(&mut vehicle.status, self.status);
        set_optional_text(&mut vehicle.insurance_expiry, &self.insurance_expiry);
        set_optional_text(&mut vehicle.inspection_expiry, &self.inspection_expiry);
        set_optional_text(&mut vehicle.kasko_expiry, &self.kasko_expiry);
        set_optional(&mut vehicle.assigned_driver_id, self.assigned_driver_id);
        set_optional(&mut vehicle.current_km, self.current_km);
        set_optional_text(&mut vehicle.last_oil_change_date, &self.last_oil_change_date);
        set_optional(&mut vehicle.last_oil_change_km, self.last_oil_change_km);
        set_optional_text(&mut vehicle.next_oil_change_date, &self.next_oil_change_date);
        set_optional(&mut vehicle.next_oil_change_km, self.next_oil_change_km);
        set_optional_text(&mut vehicle.notes, &self.notes);
    }
}

fn validate_year(year: i32, now: DateTime<Utc>) -> DomainResult<()> {
    let max = now.year() + 1;
    if !(1950..=max).contains(&year) {
        return Err(DomainError::validation(format!("year must be within 1950..={max}")));
    }
    Ok(())
}
