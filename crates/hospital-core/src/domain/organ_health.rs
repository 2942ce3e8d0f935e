//! Organ-health heuristics derived from a patient's vitals.
//!
//! The dashboard shows a small per-organ card for each patient.  The card is
//! computed once, when the patient is registered, from whatever vitals were
//! supplied at the time:
//!
//! | Organ | Assessed when                          | Caution when                         |
//! |-------|----------------------------------------|--------------------------------------|
//! | Heart | heart rate or blood pressure present   | heart rate > 100 or systolic > 140   |
//! | Lungs | oxygen saturation or resp. rate present| SpO2 < 95 or respiratory rate > 20   |
//!
//! An organ with no relevant vitals is simply absent from the map, so a
//! patient registered without vitals has an empty [`OrganHealth`].
//!
//! The assessment is NOT recomputed when vitals are updated later; the card
//! keeps describing the patient as they were on arrival.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::patient::Vitals;

/// Heart rate above which the heart is flagged, in beats per minute.
pub const HEART_RATE_CAUTION_BPM: f64 = 100.0;
/// Systolic pressure above which the heart is flagged, in mmHg.
pub const SYSTOLIC_CAUTION_MMHG: f64 = 140.0;
/// Oxygen saturation below which the lungs are flagged, in percent.
pub const SPO2_CAUTION_PERCENT: f64 = 95.0;
/// Respiratory rate above which the lungs are flagged, in breaths per minute.
pub const RESPIRATORY_RATE_CAUTION: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organ {
    Heart,
    Lungs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganStatus {
    Normal,
    Caution,
}

/// Status of one organ plus the human-readable reasons behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganAssessment {
    pub status: OrganStatus,
    #[serde(default)]
    pub alerts: Vec<String>,
}

impl OrganAssessment {
    fn from_alerts(alerts: Vec<String>) -> Self {
        let status = if alerts.is_empty() {
            OrganStatus::Normal
        } else {
            OrganStatus::Caution
        };
        Self { status, alerts }
    }

    pub fn is_caution(&self) -> bool {
        self.status == OrganStatus::Caution
    }
}

/// Per-organ assessments keyed by [`Organ`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganHealth(BTreeMap<Organ, OrganAssessment>);

impl OrganHealth {
    /// Derives the organ-health map from `vitals`.
    pub fn assess(vitals: &Vitals) -> Self {
        let mut map = BTreeMap::new();

        if vitals.heart_rate.is_some() || vitals.blood_pressure.is_some() {
            map.insert(Organ::Heart, assess_heart(vitals));
        }
        if vitals.oxygen_saturation.is_some() || vitals.respiratory_rate.is_some() {
            map.insert(Organ::Lungs, assess_lungs(vitals));
        }

        Self(map)
    }

    pub fn get(&self, organ: Organ) -> Option<&OrganAssessment> {
        self.0.get(&organ)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of organs currently flagged `Caution`.
    pub fn caution_count(&self) -> usize {
        self.0.values().filter(|a| a.is_caution()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Organ, &OrganAssessment)> {
        self.0.iter()
    }
}

fn assess_heart(vitals: &Vitals) -> OrganAssessment {
    let mut alerts = Vec::new();

    if let Some(rate) = vitals.heart_rate {
        if rate > HEART_RATE_CAUTION_BPM {
            alerts.push(format!("Elevated heart rate ({rate} bpm)"));
        }
    }
    if let Some(systolic) = vitals.systolic() {
        if systolic > SYSTOLIC_CAUTION_MMHG {
            alerts.push(format!("High systolic blood pressure ({systolic} mmHg)"));
        }
    }

    OrganAssessment::from_alerts(alerts)
}

fn assess_lungs(vitals: &Vitals) -> OrganAssessment {
    let mut alerts = Vec::new();

    if let Some(spo2) = vitals.oxygen_saturation {
        if spo2 < SPO2_CAUTION_PERCENT {
            alerts.push(format!("Low oxygen saturation ({spo2}%)"));
        }
    }
    if let Some(rate) = vitals.respiratory_rate {
        if rate > RESPIRATORY_RATE_CAUTION {
            alerts.push(format!("Elevated respiratory rate ({rate}/min)"));
        }
    }

    OrganAssessment::from_alerts(alerts)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals() -> Vitals {
        Vitals::default()
    }

    #[test]
    fn test_no_vitals_yields_empty_map() {
        let health = OrganHealth::assess(&vitals());
        assert!(health.is_empty());
    }

    #[test]
    fn test_heart_rate_110_alone_flags_heart_caution() {
        // Arrange
        let v = Vitals {
            heart_rate: Some(110.0),
            ..vitals()
        };

        // Act
        let health = OrganHealth::assess(&v);

        // Assert
        let heart = health.get(Organ::Heart).expect("heart must be assessed");
        assert_eq!(heart.status, OrganStatus::Caution);
        assert!(!heart.alerts.is_empty());
        assert!(health.get(Organ::Lungs).is_none(), "lungs have no vitals");
    }

    #[test]
    fn test_heart_rate_exactly_at_threshold_is_normal() {
        let v = Vitals {
            heart_rate: Some(100.0),
            ..vitals()
        };
        let health = OrganHealth::assess(&v);
        assert_eq!(health.get(Organ::Heart).unwrap().status, OrganStatus::Normal);
        assert!(health.get(Organ::Heart).unwrap().alerts.is_empty());
    }

    #[test]
    fn test_blood_pressure_alone_triggers_heart_assessment() {
        let v = Vitals {
            blood_pressure: Some("150/95".to_string()),
            ..vitals()
        };
        let health = OrganHealth::assess(&v);
        let heart = health.get(Organ::Heart).unwrap();
        assert!(heart.is_caution());
        assert!(heart.alerts[0].contains("150"));
    }

    #[test]
    fn test_unparseable_blood_pressure_assesses_heart_as_normal() {
        // Presence of the field triggers the assessment even if it cannot be read.
        let v = Vitals {
            blood_pressure: Some("n/a".to_string()),
            ..vitals()
        };
        let health = OrganHealth::assess(&v);
        assert_eq!(health.get(Organ::Heart).unwrap().status, OrganStatus::Normal);
    }

    #[test]
    fn test_low_spo2_flags_lungs() {
        let v = Vitals {
            oxygen_saturation: Some(92.0),
            ..vitals()
        };
        let health = OrganHealth::assess(&v);
        assert!(health.get(Organ::Lungs).unwrap().is_caution());
        assert!(health.get(Organ::Heart).is_none());
    }

    #[test]
    fn test_fast_breathing_flags_lungs() {
        let v = Vitals {
            respiratory_rate: Some(24.0),
            oxygen_saturation: Some(98.0),
            ..vitals()
        };
        let health = OrganHealth::assess(&v);
        let lungs = health.get(Organ::Lungs).unwrap();
        assert!(lungs.is_caution());
        assert_eq!(lungs.alerts.len(), 1);
    }

    #[test]
    fn test_both_organs_flagged_counts_two_cautions() {
        let v = Vitals {
            heart_rate: Some(120.0),
            blood_pressure: Some("160/100".to_string()),
            oxygen_saturation: Some(90.0),
            respiratory_rate: Some(28.0),
            temperature: None,
        };
        let health = OrganHealth::assess(&v);
        assert_eq!(health.len(), 2);
        assert_eq!(health.caution_count(), 2);
        assert_eq!(health.get(Organ::Heart).unwrap().alerts.len(), 2);
        assert_eq!(health.get(Organ::Lungs).unwrap().alerts.len(), 2);
    }

    #[test]
    fn test_serializes_as_lowercase_organ_keys() {
        let v = Vitals {
            heart_rate: Some(72.0),
            ..vitals()
        };
        let json = serde_json::to_value(OrganHealth::assess(&v)).unwrap();
        assert_eq!(json["heart"]["status"], "Normal");
    }
}
