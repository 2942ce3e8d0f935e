//! Ambulance fleet and ambulance requests.
//!
//! # Request lifecycle (for beginners)
//!
//! ```text
//!             accept(ambulance)
//! Pending ───────────────────────► Accepted ──► En Route ──► Arrived ──► Completed
//!    │                                │            │            │
//!    └────────────── cancel ──────────┴────────────┴────────────┴──► Cancelled
//! ```
//!
//! - Accepting assigns an ambulance and puts it `On Route`.
//! - Completing or cancelling a request that had an ambulance hands the
//!   ambulance back (`Available`).
//! - `Completed` and `Cancelled` are terminal.
//!
//! A request refers to its patient by id only; deleting the patient does not
//! touch the request.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmbulanceStatus {
    Available,
    #[serde(rename = "On Route")]
    OnRoute,
    Maintenance,
}

impl fmt::Display for AmbulanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AmbulanceStatus::Available => "Available",
            AmbulanceStatus::OnRoute => "On Route",
            AmbulanceStatus::Maintenance => "Maintenance",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ambulance {
    pub id: String,
    pub vehicle_number: String,
    pub driver_name: String,
    #[serde(default)]
    pub driver_phone: Option<String>,
    pub status: AmbulanceStatus,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Accepted,
    #[serde(rename = "En Route")]
    EnRoute,
    Arrived,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    /// Whether `next` is the forward step after `self` in the trip itself
    /// (Accepted → En Route → Arrived → Completed).  Acceptance and
    /// cancellation have their own operations.
    pub fn can_advance_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Accepted, RequestStatus::EnRoute)
                | (RequestStatus::EnRoute, RequestStatus::Arrived)
                | (RequestStatus::Arrived, RequestStatus::Completed)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Accepted => "Accepted",
            RequestStatus::EnRoute => "En Route",
            RequestStatus::Arrived => "Arrived",
            RequestStatus::Completed => "Completed",
            RequestStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// How urgently the caller needs the ambulance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbulanceRequest {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub pickup_location: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: RequestStatus,
    #[serde(default)]
    pub assigned_ambulance_id: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAmbulanceRequest {
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub pickup_location: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AmbulanceRequest {
    pub(crate) fn pending(id: String, new: NewAmbulanceRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            pickup_location: new.pickup_location,
            destination: new.destination,
            priority: new.priority,
            notes: new.notes,
            status: RequestStatus::Pending,
            assigned_ambulance_id: None,
            requested_at: now,
            updated_at: now,
        }
    }
}
