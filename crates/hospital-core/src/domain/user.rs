//! The signed-in user and the hospitals offered at login.
//!
//! The backend serializes users as a flat JSON object with a `role` tag and
//! whichever identifiers make sense for that role: staff carry a `staff_id`,
//! patients a `patient_id` and `contact_number`.  [`User`] keeps that flat
//! shape so the persisted record round-trips unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Nurse,
    Admin,
    #[default]
    Staff,
    Patient,
}

impl Role {
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Patient)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    /// Fills every field that is empty on `self` from `other`.  Fields that
    /// are already set, and the role, are kept.
    pub fn fill_from(&mut self, other: &User) {
        if self.id.is_empty() {
            self.id.clone_from(&other.id);
        }
        fill(&mut self.name, &other.name);
        fill(&mut self.email, &other.email);
        fill(&mut self.hospital_id, &other.hospital_id);
        fill(&mut self.staff_id, &other.staff_id);
        fill(&mut self.patient_id, &other.patient_id);
        fill(&mut self.contact_number, &other.contact_number);
        fill(&mut self.department, &other.department);
        fill(&mut self.specialization, &other.specialization);
        fill(&mut self.phone, &other.phone);
    }

    /// Name to show in a header: the name if known, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

/// A hospital selectable on the login screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub hospital_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}
