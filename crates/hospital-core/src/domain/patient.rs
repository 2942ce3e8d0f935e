//! Patient entity and the records it owns (medications, surgeries).
//!
//! A [`Patient`] is created by the store from a [`NewPatient`] and from then on
//! changed only through [`PatientUpdate`], which deliberately has no field for
//! the id or the registration time: both are fixed at creation.
//!
//! Medications and surgeries belong to exactly one patient.  Their ids are
//! generated locally by the store and are unique within that patient's list.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::organ_health::OrganHealth;

/// Oxygen saturation below which a patient is considered critical, in percent.
const CRITICAL_SPO2_PERCENT: f64 = 90.0;
/// Heart rate above which a patient is considered critical, in bpm.
const CRITICAL_HEART_RATE_BPM: f64 = 130.0;
/// Systolic pressure above which a patient is considered critical, in mmHg.
const CRITICAL_SYSTOLIC_MMHG: f64 = 180.0;

// ── Vitals ────────────────────────────────────────────────────────────────────

/// Vital signs as captured at the bedside.  Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Beats per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Free text in `"systolic/diastolic"` form, e.g. `"120/80"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    /// SpO2 in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    /// Breaths per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    /// Degrees Celsius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Vitals {
    /// Systolic pressure parsed from `blood_pressure`, if it can be read.
    ///
    /// Accepts `"140/90"` as well as a bare `"140"`.
    pub fn systolic(&self) -> Option<f64> {
        let raw = self.blood_pressure.as_deref()?;
        let first = raw.split('/').next()?.trim();
        first.parse::<f64>().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.blood_pressure.is_none()
            && self.oxygen_saturation.is_none()
            && self.respiratory_rate.is_none()
            && self.temperature.is_none()
    }

    /// Overwrites every field that is present in `update`.
    pub fn merge(&mut self, update: Vitals) {
        if update.heart_rate.is_some() {
            self.heart_rate = update.heart_rate;
        }
        if update.blood_pressure.is_some() {
            self.blood_pressure = update.blood_pressure;
        }
        if update.oxygen_saturation.is_some() {
            self.oxygen_saturation = update.oxygen_saturation;
        }
        if update.respiratory_rate.is_some() {
            self.respiratory_rate = update.respiratory_rate;
        }
        if update.temperature.is_some() {
            self.temperature = update.temperature;
        }
    }
}

// ── Risk level ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Derives a risk level from the registration vitals and organ assessment.
    ///
    /// Critical thresholds win outright; otherwise the level rises with the
    /// number of organs flagged `Caution`.
    pub fn derive(vitals: &Vitals, organ_health: &OrganHealth) -> Self {
        let critical = vitals
            .oxygen_saturation
            .is_some_and(|s| s < CRITICAL_SPO2_PERCENT)
            || vitals
                .heart_rate
                .is_some_and(|r| r > CRITICAL_HEART_RATE_BPM)
            || vitals
                .systolic()
                .is_some_and(|s| s > CRITICAL_SYSTOLIC_MMHG);
        if critical {
            return RiskLevel::Critical;
        }

        match organ_health.caution_count() {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

// ── Medications ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub prescribed_by: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub prescribed_by: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Partial update for a [`Medication`]; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationUpdate {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub prescribed_by: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

impl Medication {
    pub(crate) fn create(id: String, new: NewMedication) -> Self {
        Self {
            id,
            name: new.name,
            dosage: new.dosage,
            frequency: new.frequency,
            prescribed_by: new.prescribed_by,
            start_date: new.start_date,
            end_date: new.end_date,
            active: true,
        }
    }

    pub(crate) fn apply(&mut self, update: MedicationUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(dosage) = update.dosage {
            self.dosage = dosage;
        }
        if let Some(frequency) = update.frequency {
            self.frequency = frequency;
        }
        if update.prescribed_by.is_some() {
            self.prescribed_by = update.prescribed_by;
        }
        if update.end_date.is_some() {
            self.end_date = update.end_date;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
    }
}

// ── Surgeries ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurgeryStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surgery {
    pub id: String,
    pub procedure: String,
    #[serde(default)]
    pub surgeon: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<NaiveDate>,
    pub status: SurgeryStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSurgery {
    pub procedure: String,
    #[serde(default)]
    pub surgeon: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurgeryUpdate {
    pub procedure: Option<String>,
    pub surgeon: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
    pub status: Option<SurgeryStatus>,
    pub notes: Option<String>,
}

impl Surgery {
    pub(crate) fn create(id: String, new: NewSurgery) -> Self {
        Self {
            id,
            procedure: new.procedure,
            surgeon: new.surgeon,
            scheduled_for: new.scheduled_for,
            status: SurgeryStatus::Scheduled,
            notes: new.notes,
        }
    }

    pub(crate) fn apply(&mut self, update: SurgeryUpdate) {
        if let Some(procedure) = update.procedure {
            self.procedure = procedure;
        }
        if update.surgeon.is_some() {
            self.surgeon = update.surgeon;
        }
        if update.scheduled_for.is_some() {
            self.scheduled_for = update.scheduled_for;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
    }
}

// ── Patient ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub assigned_doctor_id: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub vitals: Vitals,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub surgeries: Vec<Surgery>,
    #[serde(default)]
    pub organ_health: OrganHealth,
    registered_at: DateTime<Utc>,
}

/// Everything needed to register a patient.  The id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub assigned_doctor_id: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub vitals: Vitals,
    /// Explicit risk level; derived from the vitals when absent.
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

/// Partial update for a [`Patient`].
///
/// `vitals` is merged field by field.  The organ-health map is left as it was
/// computed at registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub department: Option<String>,
    pub assigned_doctor_id: Option<String>,
    pub diagnosis: Option<String>,
    pub vitals: Option<Vitals>,
    pub risk_level: Option<RiskLevel>,
}

impl Patient {
    pub(crate) fn register(id: String, new: NewPatient, now: DateTime<Utc>) -> Self {
        let organ_health = OrganHealth::assess(&new.vitals);
        let risk_level = new
            .risk_level
            .unwrap_or_else(|| RiskLevel::derive(&new.vitals, &organ_health));

        Self {
            id,
            name: new.name,
            age: new.age,
            gender: new.gender,
            blood_group: new.blood_group,
            contact_number: new.contact_number,
            address: new.address,
            emergency_contact: new.emergency_contact,
            department: new.department,
            assigned_doctor_id: new.assigned_doctor_id,
            diagnosis: new.diagnosis,
            vitals: new.vitals,
            risk_level,
            medications: Vec::new(),
            surgeries: Vec::new(),
            organ_health,
            registered_at: now,
        }
    }

    /// When the patient was registered.  Never changes after creation.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub(crate) fn apply(&mut self, update: PatientUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.age.is_some() {
            self.age = update.age;
        }
        if update.gender.is_some() {
            self.gender = update.gender;
        }
        if update.blood_group.is_some() {
            self.blood_group = update.blood_group;
        }
        if update.contact_number.is_some() {
            self.contact_number = update.contact_number;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
        if update.emergency_contact.is_some() {
            self.emergency_contact = update.emergency_contact;
        }
        if update.department.is_some() {
            self.department = update.department;
        }
        if update.assigned_doctor_id.is_some() {
            self.assigned_doctor_id = update.assigned_doctor_id;
        }
        if update.diagnosis.is_some() {
            self.diagnosis = update.diagnosis;
        }
        if let Some(vitals) = update.vitals {
            self.vitals.merge(vitals);
        }
        if let Some(level) = update.risk_level {
            self.risk_level = level;
        }
    }

    /// Active medications only.
    pub fn active_medications(&self) -> impl Iterator<Item = &Medication> {
        self.medications.iter().filter(|m| m.active)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_systolic_parses_slash_form() {
        let v = Vitals {
            blood_pressure: Some("142/91".to_string()),
            ..Vitals::default()
        };
        assert_eq!(v.systolic(), Some(142.0));
    }

    #[test]
    fn test_systolic_parses_bare_number_and_rejects_garbage() {
        let bare = Vitals {
            blood_pressure: Some(" 118 ".to_string()),
            ..Vitals::default()
        };
        let garbage = Vitals {
            blood_pressure: Some("high".to_string()),
            ..Vitals::default()
        };
        assert_eq!(bare.systolic(), Some(118.0));
        assert_eq!(garbage.systolic(), None);
    }

    #[test]
    fn test_vitals_merge_only_overwrites_present_fields() {
        let mut v = Vitals {
            heart_rate: Some(80.0),
            temperature: Some(36.8),
            ..Vitals::default()
        };
        v.merge(Vitals {
            heart_rate: Some(95.0),
            ..Vitals::default()
        });
        assert_eq!(v.heart_rate, Some(95.0));
        assert_eq!(v.temperature, Some(36.8));
    }

    #[test]
    fn test_register_without_vitals_is_low_risk_with_empty_organ_map() {
        let patient = Patient::register(
            "P001".to_string(),
            NewPatient {
                name: "Asha Rao".to_string(),
                ..NewPatient::default()
            },
            now(),
        );
        assert_eq!(patient.risk_level, RiskLevel::Low);
        assert!(patient.organ_health.is_empty());
        assert_eq!(patient.registered_at(), now());
    }

    #[test]
    fn test_register_derives_medium_risk_for_one_flagged_organ() {
        let patient = Patient::register(
            "P002".to_string(),
            NewPatient {
                name: "Ben Ade".to_string(),
                vitals: Vitals {
                    heart_rate: Some(110.0),
                    ..Vitals::default()
                },
                ..NewPatient::default()
            },
            now(),
        );
        assert_eq!(patient.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_register_derives_critical_for_very_low_spo2() {
        let patient = Patient::register(
            "P003".to_string(),
            NewPatient {
                name: "Chen Li".to_string(),
                vitals: Vitals {
                    oxygen_saturation: Some(86.0),
                    ..Vitals::default()
                },
                ..NewPatient::default()
            },
            now(),
        );
        assert_eq!(patient.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_explicit_risk_level_wins_over_derivation() {
        let patient = Patient::register(
            "P004".to_string(),
            NewPatient {
                name: "Dana Cruz".to_string(),
                vitals: Vitals {
                    oxygen_saturation: Some(86.0),
                    ..Vitals::default()
                },
                risk_level: Some(RiskLevel::Low),
                ..NewPatient::default()
            },
            now(),
        );
        assert_eq!(patient.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_apply_vitals_update_does_not_recompute_organ_health() {
        // Arrange: registered with normal vitals
        let mut patient = Patient::register(
            "P005".to_string(),
            NewPatient {
                name: "Eli Park".to_string(),
                vitals: Vitals {
                    heart_rate: Some(70.0),
                    ..Vitals::default()
                },
                ..NewPatient::default()
            },
            now(),
        );
        let before = patient.organ_health.clone();

        // Act: tachycardic update arrives later
        patient.apply(PatientUpdate {
            vitals: Some(Vitals {
                heart_rate: Some(140.0),
                ..Vitals::default()
            }),
            ..PatientUpdate::default()
        });

        // Assert
        assert_eq!(patient.vitals.heart_rate, Some(140.0));
        assert_eq!(patient.organ_health, before);
    }

    #[test]
    fn test_medication_apply_merges_partial_fields() {
        let mut med = Medication::create(
            "MED-1".to_string(),
            NewMedication {
                name: "Metformin".to_string(),
                dosage: "500mg".to_string(),
                frequency: "twice daily".to_string(),
                ..NewMedication::default()
            },
        );
        med.apply(MedicationUpdate {
            dosage: Some("850mg".to_string()),
            active: Some(false),
            ..MedicationUpdate::default()
        });
        assert_eq!(med.name, "Metformin");
        assert_eq!(med.dosage, "850mg");
        assert!(!med.active);
    }

    #[test]
    fn test_new_surgery_starts_scheduled() {
        let surgery = Surgery::create(
            "SUR-1".to_string(),
            NewSurgery {
                procedure: "Appendectomy".to_string(),
                surgeon: None,
                scheduled_for: None,
                notes: None,
            },
        );
        assert_eq!(surgery.status, SurgeryStatus::Scheduled);
    }
}
