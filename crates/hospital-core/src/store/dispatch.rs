//! Ambulance request dispatch.
//!
//! Each transition checks every precondition first and only then touches the
//! request and ambulance collections, so a rejected transition changes
//! nothing.

use std::sync::Arc;

use tracing::info;

use super::{local_id, HospitalStore, StoreError};
use crate::domain::ambulance::{
    AmbulanceRequest, AmbulanceStatus, NewAmbulanceRequest, RequestStatus,
};

impl HospitalStore {
    /// Files a new `Pending` request with a `REQ-<millis>` id.
    ///
    /// The patient id is recorded as given; it is not required to exist in
    /// the store.
    pub fn request_ambulance(&mut self, new: NewAmbulanceRequest) -> AmbulanceRequest {
        let now = self.now();
        let requests = &self.requests;
        let id = local_id("REQ", now, |candidate| {
            requests.iter().any(|r| r.id == candidate)
        });

        let request = AmbulanceRequest::pending(id, new, now);
        info!(
            request_id = %request.id,
            patient_id = %request.patient_id,
            priority = ?request.priority,
            "ambulance requested"
        );
        Arc::make_mut(&mut self.requests).push(request.clone());
        request
    }

    /// Assigns `ambulance_id` to a `Pending` request and puts the ambulance
    /// `On Route`.
    pub fn accept_ambulance_request(
        &mut self,
        request_id: &str,
        ambulance_id: &str,
    ) -> Result<AmbulanceRequest, StoreError> {
        let request_index = self.request_index(request_id)?;
        let ambulance_index = self.ambulance_index(ambulance_id)?;

        let current = self.requests[request_index].status;
        if current != RequestStatus::Pending {
            return Err(StoreError::InvalidTransition {
                request_id: request_id.to_string(),
                from: current,
                to: RequestStatus::Accepted,
            });
        }
        let ambulance_status = self.ambulances[ambulance_index].status;
        if ambulance_status != AmbulanceStatus::Available {
            return Err(StoreError::AmbulanceUnavailable {
                ambulance_id: ambulance_id.to_string(),
                status: ambulance_status,
            });
        }

        let now = self.now();
        Arc::make_mut(&mut self.ambulances)[ambulance_index].status = AmbulanceStatus::OnRoute;
        let request = &mut Arc::make_mut(&mut self.requests)[request_index];
        request.status = RequestStatus::Accepted;
        request.assigned_ambulance_id = Some(ambulance_id.to_string());
        request.updated_at = now;

        info!(request_id, ambulance_id, "ambulance request accepted");
        Ok(request.clone())
    }

    /// Cancels a non-terminal request.  An assigned ambulance goes back to
    /// `Available`.
    pub fn cancel_ambulance_request(
        &mut self,
        request_id: &str,
    ) -> Result<AmbulanceRequest, StoreError> {
        let request_index = self.request_index(request_id)?;
        let current = self.requests[request_index].status;
        if current.is_terminal() {
            return Err(StoreError::InvalidTransition {
                request_id: request_id.to_string(),
                from: current,
                to: RequestStatus::Cancelled,
            });
        }

        let assigned = self.requests[request_index].assigned_ambulance_id.clone();
        let now = self.now();
        {
            let request = &mut Arc::make_mut(&mut self.requests)[request_index];
            request.status = RequestStatus::Cancelled;
            request.updated_at = now;
        }
        if let Some(ambulance_id) = assigned.as_deref() {
            self.release_ambulance(ambulance_id);
        }

        info!(request_id, released = ?assigned, "ambulance request cancelled");
        Ok(self.requests[request_index].clone())
    }

    /// Moves an accepted request one step along its trip
    /// (Accepted → En Route → Arrived → Completed).  Completing releases the
    /// ambulance.
    pub fn advance_ambulance_request(
        &mut self,
        request_id: &str,
        next: RequestStatus,
    ) -> Result<AmbulanceRequest, StoreError> {
        let request_index = self.request_index(request_id)?;
        let current = self.requests[request_index].status;
        if !current.can_advance_to(next) {
            return Err(StoreError::InvalidTransition {
                request_id: request_id.to_string(),
                from: current,
                to: next,
            });
        }

        let assigned = self.requests[request_index].assigned_ambulance_id.clone();
        let now = self.now();
        {
            let request = &mut Arc::make_mut(&mut self.requests)[request_index];
            request.status = next;
            request.updated_at = now;
        }
        if next == RequestStatus::Completed {
            if let Some(ambulance_id) = assigned.as_deref() {
                self.release_ambulance(ambulance_id);
            }
        }

        info!(request_id, status = %next, "ambulance request advanced");
        Ok(self.requests[request_index].clone())
    }

    /// An ambulance that has since been removed is ignored.
    fn release_ambulance(&mut self, ambulance_id: &str) {
        if let Ok(index) = self.ambulance_index(ambulance_id) {
            Arc::make_mut(&mut self.ambulances)[index].status = AmbulanceStatus::Available;
        }
    }
}
