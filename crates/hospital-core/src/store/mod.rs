//! The in-memory domain state store.
//!
//! [`HospitalStore`] is the client's authoritative copy of every hospital
//! collection.  It is an explicit value: whoever needs it is handed a
//! reference (or an `Arc<Mutex<_>>` when a background task shares it), there
//! is no global instance.
//!
//! # Copy-on-write snapshots (for beginners)
//!
//! Every collection lives behind an `Arc`.  Read accessors such as
//! [`HospitalStore::patients`] return a clone of that `Arc`: cheap, and
//! immutable for the holder.  Mutations go through [`Arc::make_mut`], which
//! mutates in place when nobody else holds the collection and clones it first
//! when a snapshot is still alive.  The net effect is that a snapshot taken
//! before a mutation never observes that mutation.
//!
//! Every operation follows the same pattern: locate by id, merge the partial
//! update, write back.  Lookups happen before anything is changed, so an
//! operation that returns an error leaves the store exactly as it was.
//!
//! Sub-modules add the two composite behaviours:
//!
//! - **`dispatch`** – the ambulance request state machine.
//! - **`telemetry`** – the simulated bed-occupancy feed.

mod dispatch;
mod telemetry;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::ambulance::{Ambulance, AmbulanceRequest, AmbulanceStatus, RequestStatus};
use crate::domain::capacity::{
    BedAvailability, Capacity, DepartmentLoads, EmergencyStatus, EquipmentInventory, ICU_CATEGORY,
};
use crate::domain::patient::{
    Medication, MedicationUpdate, NewMedication, NewPatient, NewSurgery, Patient, PatientUpdate,
    RiskLevel, Surgery, SurgeryUpdate,
};
use crate::domain::staff::{Doctor, DoctorUpdate, Nurse, NurseUpdate};

/// Errors returned by store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("patient not found: {0}")]
    PatientNotFound(String),

    #[error("medication {medication_id} not found for patient {patient_id}")]
    MedicationNotFound {
        patient_id: String,
        medication_id: String,
    },

    #[error("surgery {surgery_id} not found for patient {patient_id}")]
    SurgeryNotFound {
        patient_id: String,
        surgery_id: String,
    },

    #[error("doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("nurse not found: {0}")]
    NurseNotFound(String),

    #[error("ambulance not found: {0}")]
    AmbulanceNotFound(String),

    #[error("ambulance request not found: {0}")]
    RequestNotFound(String),

    #[error("unknown capacity category: {0}")]
    UnknownCategory(String),

    #[error("ambulance {ambulance_id} is {status}, not Available")]
    AmbulanceUnavailable {
        ambulance_id: String,
        status: AmbulanceStatus,
    },

    #[error("ambulance request {request_id} cannot move from {from} to {to}")]
    InvalidTransition {
        request_id: String,
        from: RequestStatus,
        to: RequestStatus,
    },
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreOverview {
    pub patients: usize,
    pub critical_patients: usize,
    pub doctors_available: usize,
    pub nurses_available: usize,
    pub beds_total: u32,
    pub beds_occupied: u32,
    pub beds_available: u32,
    /// Percentage of all beds in use.
    pub bed_utilisation: f64,
    pub icu_available: Option<u32>,
    pub emergency_status: EmergencyStatus,
    pub ambulances_available: usize,
    pub ambulances_on_route: usize,
    pub open_requests: usize,
}

pub struct HospitalStore {
    clock: Arc<dyn Clock>,
    patients: Arc<Vec<Patient>>,
    doctors: Arc<Vec<Doctor>>,
    nurses: Arc<Vec<Nurse>>,
    beds: Arc<BedAvailability>,
    equipment: Arc<EquipmentInventory>,
    departments: Arc<DepartmentLoads>,
    ambulances: Arc<Vec<Ambulance>>,
    requests: Arc<Vec<AmbulanceRequest>>,
    emergency_status: EmergencyStatus,
    next_patient_seq: u32,
}

impl HospitalStore {
    /// Creates an empty store stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            patients: Arc::default(),
            doctors: Arc::default(),
            nurses: Arc::default(),
            beds: Arc::default(),
            equipment: Arc::default(),
            departments: Arc::default(),
            ambulances: Arc::default(),
            requests: Arc::default(),
            emergency_status: EmergencyStatus::Normal,
            next_patient_seq: 1,
        }
    }

    pub fn with_beds(mut self, beds: BedAvailability) -> Self {
        self.beds = Arc::new(beds);
        self.emergency_status = EmergencyStatus::from_beds(&self.beds);
        self
    }

    pub fn with_equipment(mut self, equipment: EquipmentInventory) -> Self {
        self.equipment = Arc::new(equipment);
        self
    }

    pub fn with_departments(mut self, departments: DepartmentLoads) -> Self {
        self.departments = Arc::new(departments);
        self
    }

    pub fn with_doctors(mut self, doctors: Vec<Doctor>) -> Self {
        self.doctors = Arc::new(doctors);
        self
    }

    pub fn with_nurses(mut self, nurses: Vec<Nurse>) -> Self {
        self.nurses = Arc::new(nurses);
        self
    }

    pub fn with_ambulances(mut self, ambulances: Vec<Ambulance>) -> Self {
        self.ambulances = Arc::new(ambulances);
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    pub fn patients(&self) -> Arc<Vec<Patient>> {
        Arc::clone(&self.patients)
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn doctors(&self) -> Arc<Vec<Doctor>> {
        Arc::clone(&self.doctors)
    }

    pub fn nurses(&self) -> Arc<Vec<Nurse>> {
        Arc::clone(&self.nurses)
    }

    pub fn beds(&self) -> Arc<BedAvailability> {
        Arc::clone(&self.beds)
    }

    pub fn equipment(&self) -> Arc<EquipmentInventory> {
        Arc::clone(&self.equipment)
    }

    pub fn departments(&self) -> Arc<DepartmentLoads> {
        Arc::clone(&self.departments)
    }

    pub fn ambulances(&self) -> Arc<Vec<Ambulance>> {
        Arc::clone(&self.ambulances)
    }

    pub fn ambulance(&self, id: &str) -> Option<&Ambulance> {
        self.ambulances.iter().find(|a| a.id == id)
    }

    pub fn ambulance_requests(&self) -> Arc<Vec<AmbulanceRequest>> {
        Arc::clone(&self.requests)
    }

    pub fn ambulance_request(&self, id: &str) -> Option<&AmbulanceRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn emergency_status(&self) -> EmergencyStatus {
        self.emergency_status
    }

    // ── Patients ──────────────────────────────────────────────────────────────

    /// Registers a patient under the next sequence id (`P001`, `P002`, ...).
    pub fn add_patient(&mut self, new: NewPatient) -> Patient {
        let id = loop {
            let candidate = format!("P{:03}", self.next_patient_seq);
            self.next_patient_seq += 1;
            if self.patient(&candidate).is_none() {
                break candidate;
            }
        };

        let patient = Patient::register(id, new, self.now());
        debug!(patient_id = %patient.id, risk = ?patient.risk_level, "patient registered");
        Arc::make_mut(&mut self.patients).push(patient.clone());
        patient
    }

    pub fn update_patient(
        &mut self,
        id: &str,
        update: PatientUpdate,
    ) -> Result<Patient, StoreError> {
        let index = self.patient_index(id)?;
        let patient = &mut Arc::make_mut(&mut self.patients)[index];
        patient.apply(update);
        Ok(patient.clone())
    }

    pub fn remove_patient(&mut self, id: &str) -> Result<Patient, StoreError> {
        let index = self.patient_index(id)?;
        Ok(Arc::make_mut(&mut self.patients).remove(index))
    }

    fn patient_index(&self, id: &str) -> Result<usize, StoreError> {
        self.patients
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::PatientNotFound(id.to_string()))
    }

    // ── Medications & surgeries ───────────────────────────────────────────────

    pub fn add_medication(
        &mut self,
        patient_id: &str,
        new: NewMedication,
    ) -> Result<Medication, StoreError> {
        let index = self.patient_index(patient_id)?;
        let now = self.now();
        let patient = &mut Arc::make_mut(&mut self.patients)[index];

        let id = local_id("MED", now, |candidate| {
            patient.medications.iter().any(|m| m.id == candidate)
        });
        let medication = Medication::create(id, new);
        patient.medications.push(medication.clone());
        Ok(medication)
    }

    /// Replaces the matching medication with the merged update.
    pub fn update_medication(
        &mut self,
        patient_id: &str,
        medication_id: &str,
        update: MedicationUpdate,
    ) -> Result<Medication, StoreError> {
        let index = self.patient_index(patient_id)?;
        let position = self.patients[index]
            .medications
            .iter()
            .position(|m| m.id == medication_id)
            .ok_or_else(|| StoreError::MedicationNotFound {
                patient_id: patient_id.to_string(),
                medication_id: medication_id.to_string(),
            })?;

        let medication = &mut Arc::make_mut(&mut self.patients)[index].medications[position];
        medication.apply(update);
        Ok(medication.clone())
    }

    pub fn add_surgery(
        &mut self,
        patient_id: &str,
        new: NewSurgery,
    ) -> Result<Surgery, StoreError> {
        let index = self.patient_index(patient_id)?;
        let now = self.now();
        let patient = &mut Arc::make_mut(&mut self.patients)[index];

        let id = local_id("SUR", now, |candidate| {
            patient.surgeries.iter().any(|s| s.id == candidate)
        });
        let surgery = Surgery::create(id, new);
        patient.surgeries.push(surgery.clone());
        Ok(surgery)
    }

    pub fn update_surgery(
        &mut self,
        patient_id: &str,
        surgery_id: &str,
        update: SurgeryUpdate,
    ) -> Result<Surgery, StoreError> {
        let index = self.patient_index(patient_id)?;
        let position = self.patients[index]
            .surgeries
            .iter()
            .position(|s| s.id == surgery_id)
            .ok_or_else(|| StoreError::SurgeryNotFound {
                patient_id: patient_id.to_string(),
                surgery_id: surgery_id.to_string(),
            })?;

        let surgery = &mut Arc::make_mut(&mut self.patients)[index].surgeries[position];
        surgery.apply(update);
        Ok(surgery.clone())
    }

    // ── Staff ─────────────────────────────────────────────────────────────────

    pub fn update_doctor(&mut self, id: &str, update: DoctorUpdate) -> Result<Doctor, StoreError> {
        let index = self
            .doctors
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| StoreError::DoctorNotFound(id.to_string()))?;
        let doctor = &mut Arc::make_mut(&mut self.doctors)[index];
        doctor.apply(update);
        Ok(doctor.clone())
    }

    pub fn update_nurse(&mut self, id: &str, update: NurseUpdate) -> Result<Nurse, StoreError> {
        let index = self
            .nurses
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| StoreError::NurseNotFound(id.to_string()))?;
        let nurse = &mut Arc::make_mut(&mut self.nurses)[index];
        nurse.apply(update);
        Ok(nurse.clone())
    }

    /// Replaces the doctor directory wholesale (server sync).
    pub fn replace_doctors(&mut self, doctors: Vec<Doctor>) {
        self.doctors = Arc::new(doctors);
    }

    pub fn replace_nurses(&mut self, nurses: Vec<Nurse>) {
        self.nurses = Arc::new(nurses);
    }

    // ── Capacity ──────────────────────────────────────────────────────────────

    /// Sets the occupied beds of `category` (clamped) and refreshes the
    /// emergency status.
    pub fn set_bed_occupancy(
        &mut self,
        category: &str,
        occupied: u32,
    ) -> Result<Capacity, StoreError> {
        let updated = set_occupied(&mut self.beds, category, occupied)?;
        self.refresh_emergency_status();
        Ok(updated)
    }

    pub fn set_equipment_in_use(
        &mut self,
        name: &str,
        in_use: u32,
    ) -> Result<Capacity, StoreError> {
        set_occupied(&mut self.equipment, name, in_use)
    }

    pub fn set_department_load(
        &mut self,
        department: &str,
        current: u32,
    ) -> Result<Capacity, StoreError> {
        set_occupied(&mut self.departments, department, current)
    }

    pub(crate) fn refresh_emergency_status(&mut self) -> EmergencyStatus {
        let status = EmergencyStatus::from_beds(&self.beds);
        if status != self.emergency_status {
            debug!(from = ?self.emergency_status, to = ?status, "emergency status changed");
        }
        self.emergency_status = status;
        status
    }

    // ── Ambulances ────────────────────────────────────────────────────────────

    pub fn add_ambulance(&mut self, ambulance: Ambulance) {
        Arc::make_mut(&mut self.ambulances).push(ambulance);
    }

    /// Sets an ambulance's status directly (e.g. into or out of maintenance).
    pub fn set_ambulance_status(
        &mut self,
        id: &str,
        status: AmbulanceStatus,
    ) -> Result<Ambulance, StoreError> {
        let index = self.ambulance_index(id)?;
        let ambulance = &mut Arc::make_mut(&mut self.ambulances)[index];
        ambulance.status = status;
        Ok(ambulance.clone())
    }

    pub(crate) fn ambulance_index(&self, id: &str) -> Result<usize, StoreError> {
        self.ambulances
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| StoreError::AmbulanceNotFound(id.to_string()))
    }

    pub(crate) fn request_index(&self, id: &str) -> Result<usize, StoreError> {
        self.requests
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::RequestNotFound(id.to_string()))
    }

    // ── Overview ──────────────────────────────────────────────────────────────

    pub fn overview(&self) -> StoreOverview {
        let (beds_total, beds_occupied, beds_available) =
            self.beds.values().fold((0, 0, 0), |(t, o, a), c| {
                (t + c.total(), o + c.occupied(), a + c.available())
            });

        StoreOverview {
            patients: self.patients.len(),
            critical_patients: self
                .patients
                .iter()
                .filter(|p| p.risk_level == RiskLevel::Critical)
                .count(),
            doctors_available: self.doctors.iter().filter(|d| d.available).count(),
            nurses_available: self.nurses.iter().filter(|n| n.available).count(),
            beds_total,
            beds_occupied,
            beds_available,
            bed_utilisation: Capacity::new(beds_total, beds_occupied).utilisation(),
            icu_available: self.beds.get(ICU_CATEGORY).map(Capacity::available),
            emergency_status: self.emergency_status,
            ambulances_available: self
                .ambulances
                .iter()
                .filter(|a| a.status == AmbulanceStatus::Available)
                .count(),
            ambulances_on_route: self
                .ambulances
                .iter()
                .filter(|a| a.status == AmbulanceStatus::OnRoute)
                .count(),
            open_requests: self
                .requests
                .iter()
                .filter(|r| !r.status.is_terminal())
                .count(),
        }
    }
}

fn set_occupied(
    counters: &mut Arc<std::collections::BTreeMap<String, Capacity>>,
    key: &str,
    occupied: u32,
) -> Result<Capacity, StoreError> {
    if !counters.contains_key(key) {
        return Err(StoreError::UnknownCategory(key.to_string()));
    }
    let counter = Arc::make_mut(counters)
        .get_mut(key)
        .ok_or_else(|| StoreError::UnknownCategory(key.to_string()))?;
    counter.set_occupied(occupied);
    Ok(*counter)
}

/// Builds a `<prefix>-<millis>` id, bumping the numeric part until `taken`
/// reports it free.
pub(crate) fn local_id(
    prefix: &str,
    now: DateTime<Utc>,
    taken: impl Fn(&str) -> bool,
) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("{prefix}-{millis}");
        if !taken(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
