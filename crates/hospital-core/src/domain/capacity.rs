//! Capacity counters for beds, equipment, and department load.
//!
//! All three dashboards boil down to the same counter: a fixed `total`, a
//! moving `occupied`, and the derived `available`.  [`Capacity`] keeps the
//! invariant
//!
//! ```text
//! 0 <= occupied <= total
//! available == total - occupied
//! ```
//!
//! by construction: its fields are private, every mutator clamps and then
//! re-derives `available`, and deserialization rejects counters that break
//! the invariant instead of silently repairing them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bed category whose availability drives the emergency status.
pub const ICU_CATEGORY: &str = "ICU";
/// ICU beds available at or below which the hospital is `Critical`.
pub const CRITICAL_ICU_AVAILABLE: u32 = 2;
/// ICU beds available at or below which the hospital is `Busy`.
pub const BUSY_ICU_AVAILABLE: u32 = 5;

/// Bed occupancy keyed by category (`"ICU"`, `"General"`, ...).
pub type BedAvailability = BTreeMap<String, Capacity>;
/// Equipment in use keyed by equipment name.
pub type EquipmentInventory = BTreeMap<String, Capacity>;
/// Patient load keyed by department.
pub type DepartmentLoads = BTreeMap<String, Capacity>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("occupied count {occupied} exceeds total {total}")]
    OccupiedExceedsTotal { total: u32, occupied: u32 },

    #[error("available count {available} does not equal total {total} minus occupied {occupied}")]
    Inconsistent {
        total: u32,
        occupied: u32,
        available: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCapacity")]
pub struct Capacity {
    total: u32,
    occupied: u32,
    available: u32,
}

/// Wire shape before the invariant is checked.
#[derive(Deserialize)]
struct RawCapacity {
    total: u32,
    occupied: u32,
    #[serde(default)]
    available: Option<u32>,
}

impl TryFrom<RawCapacity> for Capacity {
    type Error = CapacityError;

    fn try_from(raw: RawCapacity) -> Result<Self, Self::Error> {
        if raw.occupied > raw.total {
            return Err(CapacityError::OccupiedExceedsTotal {
                total: raw.total,
                occupied: raw.occupied,
            });
        }
        let derived = raw.total - raw.occupied;
        match raw.available {
            Some(available) if available != derived => Err(CapacityError::Inconsistent {
                total: raw.total,
                occupied: raw.occupied,
                available,
            }),
            _ => Ok(Self {
                total: raw.total,
                occupied: raw.occupied,
                available: derived,
            }),
        }
    }
}

impl Capacity {
    /// Creates a counter, clamping `occupied` into `[0, total]`.
    pub fn new(total: u32, occupied: u32) -> Self {
        let mut capacity = Self {
            total,
            occupied,
            available: 0,
        };
        capacity.rederive();
        capacity
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn occupied(&self) -> u32 {
        self.occupied
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    /// Sets the occupied count, clamped to `total`.
    pub fn set_occupied(&mut self, occupied: u32) {
        self.occupied = occupied;
        self.rederive();
    }

    /// Adds `delta` (which may be negative) to the occupied count, clamped
    /// to `[0, total]`.
    pub fn adjust(&mut self, delta: i64) {
        let next = (i64::from(self.occupied) + delta).clamp(0, i64::from(self.total));
        // `next` is within [0, total] so it always fits in a u32.
        self.occupied = u32::try_from(next).unwrap_or(self.total);
        self.rederive();
    }

    /// Percentage of capacity in use, `0.0` for an empty counter.
    pub fn utilisation(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.occupied) * 100.0 / f64::from(self.total)
        }
    }

    fn rederive(&mut self) {
        self.occupied = self.occupied.min(self.total);
        self.available = self.total - self.occupied;
    }
}

// ── Emergency status ──────────────────────────────────────────────────────────

/// Hospital-wide pressure indicator shown in the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmergencyStatus {
    #[default]
    Normal,
    Busy,
    Critical,
}

impl EmergencyStatus {
    /// Maps ICU availability to a status: `<= 2` Critical, `<= 5` Busy,
    /// anything above Normal.
    pub fn from_icu_available(available: u32) -> Self {
        if available <= CRITICAL_ICU_AVAILABLE {
            EmergencyStatus::Critical
        } else if available <= BUSY_ICU_AVAILABLE {
            EmergencyStatus::Busy
        } else {
            EmergencyStatus::Normal
        }
    }

    /// Derives the status from a bed board.  Without an ICU category the
    /// hospital is reported as `Normal`.
    pub fn from_beds(beds: &BedAvailability) -> Self {
        beds.get(ICU_CATEGORY)
            .map(|icu| Self::from_icu_available(icu.available()))
            .unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
