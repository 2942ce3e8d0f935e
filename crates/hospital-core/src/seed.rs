//! Demo data for a freshly started dashboard.
//!
//! The backend has no endpoints for beds, equipment, or the ambulance fleet,
//! so the dashboard starts from this board and animates it locally.

use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::ambulance::{Ambulance, AmbulanceStatus};
use crate::domain::capacity::{BedAvailability, Capacity, DepartmentLoads, EquipmentInventory};
use crate::domain::patient::{NewPatient, Vitals};
use crate::domain::staff::{Doctor, Nurse, Shift};
use crate::store::HospitalStore;

/// Bed board as `(category, total, occupied)`.
const BEDS: &[(&str, u32, u32)] = &[
    ("ICU", 20, 14),
    ("General", 120, 85),
    ("Emergency", 30, 22),
    ("Pediatric", 40, 18),
    ("Maternity", 25, 12),
];

const EQUIPMENT: &[(&str, u32, u32)] = &[
    ("Ventilators", 15, 9),
    ("Defibrillators", 10, 3),
    ("Dialysis Machines", 8, 5),
    ("MRI Scanners", 2, 1),
    ("X-Ray Machines", 4, 2),
];

const DEPARTMENTS: &[(&str, u32, u32)] = &[
    ("Cardiology", 40, 28),
    ("Neurology", 30, 17),
    ("Orthopedics", 35, 21),
    ("Pediatrics", 40, 18),
    ("Emergency", 30, 22),
];

fn board(rows: &[(&str, u32, u32)]) -> std::collections::BTreeMap<String, Capacity> {
    rows.iter()
        .map(|&(name, total, occupied)| (name.to_string(), Capacity::new(total, occupied)))
        .collect()
}

pub fn beds() -> BedAvailability {
    board(BEDS)
}

pub fn equipment() -> EquipmentInventory {
    board(EQUIPMENT)
}

pub fn departments() -> DepartmentLoads {
    board(DEPARTMENTS)
}

pub fn ambulances() -> Vec<Ambulance> {
    let fleet = [
        ("AMB-001", "KA-01-AB-1234", "Rajesh Kumar", AmbulanceStatus::Available, "Main Gate"),
        ("AMB-002", "KA-01-CD-5678", "Suresh Reddy", AmbulanceStatus::Available, "Emergency Bay"),
        ("AMB-003", "KA-01-EF-9012", "Anil Sharma", AmbulanceStatus::OnRoute, "MG Road"),
        ("AMB-004", "KA-01-GH-3456", "Vikram Singh", AmbulanceStatus::Available, "Main Gate"),
        ("AMB-005", "KA-01-IJ-7890", "Manoj Patil", AmbulanceStatus::Maintenance, "Service Center"),
    ];

    fleet
        .into_iter()
        .map(|(id, vehicle, driver, status, location)| Ambulance {
            id: id.to_string(),
            vehicle_number: vehicle.to_string(),
            driver_name: driver.to_string(),
            driver_phone: None,
            status,
            location: Some(location.to_string()),
        })
        .collect()
}

pub fn doctors() -> Vec<Doctor> {
    let roster = [
        ("D001", "Dr. Sarah Johnson", "Cardiology"),
        ("D002", "Dr. Michael Chen", "Neurology"),
        ("D003", "Dr. Priya Nair", "Orthopedics"),
        ("D004", "Dr. James Wilson", "Pediatrics"),
    ];

    roster
        .into_iter()
        .map(|(id, name, department)| Doctor {
            id: id.to_string(),
            name: name.to_string(),
            specialization: Some(department.to_string()),
            department: Some(department.to_string()),
            phone: None,
            email: None,
            available: true,
            assigned_patients: Vec::new(),
        })
        .collect()
}

pub fn nurses() -> Vec<Nurse> {
    let roster = [
        ("N001", "Emily Davis", "ICU", Shift::Morning),
        ("N002", "Grace Thomas", "Emergency", Shift::Afternoon),
        ("N003", "Lakshmi Rao", "General", Shift::Night),
    ];

    roster
        .into_iter()
        .map(|(id, name, ward, shift)| Nurse {
            id: id.to_string(),
            name: name.to_string(),
            department: Some(ward.to_string()),
            shift: Some(shift),
            phone: None,
            available: true,
            assigned_ward: Some(ward.to_string()),
            assigned_patients: Vec::new(),
        })
        .collect()
}

/// A store populated with the demo board, staff, fleet, and two patients.
pub fn demo_store(clock: Arc<dyn Clock>) -> HospitalStore {
    let mut store = HospitalStore::new(clock)
        .with_beds(beds())
        .with_equipment(equipment())
        .with_departments(departments())
        .with_doctors(doctors())
        .with_nurses(nurses())
        .with_ambulances(ambulances());

    store.add_patient(NewPatient {
        name: "John Smith".to_string(),
        age: Some(45),
        gender: Some("Male".to_string()),
        blood_group: Some("O+".to_string()),
        department: Some("Cardiology".to_string()),
        assigned_doctor_id: Some("D001".to_string()),
        diagnosis: Some("Hypertension".to_string()),
        vitals: Vitals {
            heart_rate: Some(88.0),
            blood_pressure: Some("150/95".to_string()),
            oxygen_saturation: Some(97.0),
            respiratory_rate: Some(16.0),
            temperature: Some(36.9),
        },
        ..NewPatient::default()
    });
    store.add_patient(NewPatient {
        name: "Maria Garcia".to_string(),
        age: Some(32),
        gender: Some("Female".to_string()),
        blood_group: Some("A-".to_string()),
        department: Some("Neurology".to_string()),
        assigned_doctor_id: Some("D002".to_string()),
        diagnosis: Some("Migraine".to_string()),
        vitals: Vitals {
            heart_rate: Some(72.0),
            blood_pressure: Some("118/76".to_string()),
            oxygen_saturation: Some(99.0),
            respiratory_rate: Some(14.0),
            temperature: Some(36.6),
        },
        ..NewPatient::default()
    });

    store
}
