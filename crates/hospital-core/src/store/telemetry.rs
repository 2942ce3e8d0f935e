//! Simulated bed-occupancy telemetry.
//!
//! Each tick nudges every bed category by one bed up or down with equal
//! probability, clamped to the category's capacity, then recomputes the
//! emergency status.  The random source is a parameter so tests can pass a
//! seeded generator.

use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use super::HospitalStore;
use crate::domain::capacity::EmergencyStatus;

impl HospitalStore {
    /// Applies one simulation step and returns the resulting emergency status.
    pub fn simulate_tick<R: Rng>(&mut self, rng: &mut R) -> EmergencyStatus {
        if !self.beds.is_empty() {
            for (category, counter) in Arc::make_mut(&mut self.beds).iter_mut() {
                let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
                counter.adjust(delta);
                trace!(%category, occupied = counter.occupied(), "bed occupancy tick");
            }
        }
        self.refresh_emergency_status()
    }
}
