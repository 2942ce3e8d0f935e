//! Domain entities for Hospital Ops.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What belongs here?
//!
//! - The entity types mirrored by the client (patients, staff, capacity
//!   counters, ambulances, the session user).
//! - Rules that are true regardless of where the data came from: the capacity
//!   invariant, the organ-health thresholds, the ambulance request lifecycle.
//!
//! # What does NOT belong here?
//!
//! - HTTP, JSON error envelopes, or token handling (see `hospital-client`).
//! - Collections and mutation bookkeeping (see [`crate::store`]).

pub mod ambulance;
pub mod capacity;
pub mod organ_health;
pub mod patient;
pub mod staff;
pub mod user;
