//! # hospital-core
//!
//! Shared library for Hospital Ops containing the domain entities, the
//! clinical derivations (organ health, risk level), and the in-memory domain
//! state store that mirrors hospital entities on the client.
//!
//! This crate has zero dependencies on HTTP clients, file systems, or async
//! runtimes.  Everything that talks to the outside world lives in
//! `hospital-client`.
//!
//! # Architecture overview (for beginners)
//!
//! The hospital dashboard shows a live picture of the hospital: patients and
//! their vitals, staff on shift, bed occupancy, equipment in use, and the
//! ambulance fleet.  Some of that data comes from the REST backend, some is
//! simulated locally so the dashboard stays animated.
//!
//! This crate (`hospital-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The entity types (`Patient`, `Doctor`, `Ambulance`, ...)
//!   and pure rules such as the organ-health derivation and the capacity
//!   counter invariant `available = total - occupied`.
//!
//! - **`store`** – `HospitalStore`, the client's authoritative in-memory copy
//!   of every collection.  Mutations are copy-on-write: a snapshot handed out
//!   earlier never changes underneath its holder.  The ambulance dispatch state
//!   machine and the telemetry simulation live here too.
//!
//! - **`clock`** – The `Clock` trait, so timestamps and locally generated ids
//!   are deterministic in tests.
//!
//! - **`seed`** – Demo data used to populate a fresh dashboard.

pub mod clock;
pub mod domain;
pub mod seed;
pub mod store;

// Re-export the most-used types at the crate root so callers can write
// `hospital_core::HospitalStore` instead of `hospital_core::store::HospitalStore`.
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::ambulance::{
    Ambulance, AmbulanceRequest, AmbulanceStatus, NewAmbulanceRequest, Priority, RequestStatus,
};
pub use domain::capacity::{Capacity, CapacityError, EmergencyStatus};
pub use domain::organ_health::{Organ, OrganAssessment, OrganHealth, OrganStatus};
pub use domain::patient::{
    Medication, MedicationUpdate, NewMedication, NewPatient, NewSurgery, Patient, PatientUpdate,
    RiskLevel, Surgery, SurgeryStatus, SurgeryUpdate, Vitals,
};
pub use domain::staff::{Doctor, DoctorUpdate, Nurse, NurseUpdate, Shift};
pub use domain::user::{Hospital, Role, User};
pub use store::{HospitalStore, StoreError, StoreOverview};
