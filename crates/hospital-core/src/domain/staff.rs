//! Doctors and nurses.
//!
//! Staff records arrive from the backend directory (`/doctor`, `/nurse`),
//! which identifies people by `staff_id`; that field is accepted as an alias
//! for `id`.  Locally the dashboard only toggles availability and assignment,
//! always through a partial update keyed by id.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(alias = "staff_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub assigned_patients: Vec<String>,
}

/// Partial update for a [`Doctor`]; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub available: Option<bool>,
    pub assigned_patients: Option<Vec<String>>,
}

impl Doctor {
    pub fn apply(&mut self, update: DoctorUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.specialization.is_some() {
            self.specialization = update.specialization;
        }
        if update.department.is_some() {
            self.department = update.department;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        if let Some(patients) = update.assigned_patients {
            self.assigned_patients = patients;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nurse {
    #[serde(alias = "staff_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub shift: Option<Shift>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub assigned_ward: Option<String>,
    #[serde(default)]
    pub assigned_patients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NurseUpdate {
    pub name: Option<String>,
    pub department: Option<String>,
    pub shift: Option<Shift>,
    pub phone: Option<String>,
    pub available: Option<bool>,
    pub assigned_ward: Option<String>,
    pub assigned_patients: Option<Vec<String>>,
}

impl Nurse {
    pub fn apply(&mut self, update: NurseUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.department.is_some() {
            self.department = update.department;
        }
        if update.shift.is_some() {
            self.shift = update.shift;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        if update.assigned_ward.is_some() {
            self.assigned_ward = update.assigned_ward;
        }
        if let Some(patients) = update.assigned_patients {
            self.assigned_patients = patients;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_deserializes_backend_directory_entry() {
        // Arrange: shape returned by GET /doctor
        let json = r#"{
            "_id": "65f0c0ffee",
            "staff_id": "DOC-17",
            "name": "Dr. Meera Iyer",
            "specialization": "Cardiology",
            "department": "Cardiology",
            "qualifications": ["MBBS", "MD"],
            "is_active": true
        }"#;

        // Act
        let doctor: Doctor = serde_json::from_str(json).expect("deserialize");

        // Assert
        assert_eq!(doctor.id, "DOC-17");
        assert!(doctor.available, "availability defaults to true");
        assert!(doctor.assigned_patients.is_empty());
    }

    #[test]
    fn test_doctor_apply_merges_only_present_fields() {
        let mut doctor = Doctor {
            id: "D001".to_string(),
            name: "Dr. Okafor".to_string(),
            specialization: Some("Neurology".to_string()),
            department: Some("Neurology".to_string()),
            phone: None,
            email: None,
            available: true,
            assigned_patients: vec![],
        };

        doctor.apply(DoctorUpdate {
            available: Some(false),
            assigned_patients: Some(vec!["P001".to_string()]),
            ..DoctorUpdate::default()
        });

        assert_eq!(doctor.name, "Dr. Okafor");
        assert_eq!(doctor.specialization.as_deref(), Some("Neurology"));
        assert!(!doctor.available);
        assert_eq!(doctor.assigned_patients, vec!["P001".to_string()]);
    }

    #[test]
    fn test_nurse_shift_is_lowercase_on_the_wire() {
        let json = r#"{"staff_id":"NUR-3","name":"Grace","shift":"night"}"#;
        let nurse: Nurse = serde_json::from_str(json).unwrap();
        assert_eq!(nurse.shift, Some(Shift::Night));
    }

    #[test]
    fn test_nurse_afternoon_shift_deserializes() {
        let json = r#"{"staff_id":"N1","name":"Asha","shift":"afternoon"}"#;

        let nurse: Nurse = serde_json::from_str(json).expect("afternoon is a backend shift");

        assert_eq!(nurse.shift, Some(Shift::Afternoon));
        assert_eq!(
            serde_json::to_value(Shift::Afternoon).unwrap(),
            serde_json::json!("afternoon")
        );
    }

    #[test]
    fn test_nurse_apply_changes_ward() {
        let mut nurse: Nurse =
            serde_json::from_str(r#"{"id":"N001","name":"Grace"}"#).unwrap();
        nurse.apply(NurseUpdate {
            assigned_ward: Some("ICU".to_string()),
            ..NurseUpdate::default()
        });
        assert_eq!(nurse.assigned_ward.as_deref(), Some("ICU"));
        assert!(nurse.available);
    }
}
