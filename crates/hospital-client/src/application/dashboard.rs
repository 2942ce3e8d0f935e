//! DashboardService: the live hospital picture.
//!
//! The service owns the shared [`HospitalStore`] behind a
//! `tokio::sync::Mutex`.  Two kinds of writers use it:
//!
//! - **Server sync** ([`DashboardService::sync_staff`]) replaces the staff
//!   directory with what `/doctor` and `/nurse` return.
//! - **Telemetry** ([`DashboardService::run_simulation`]) applies one
//!   simulated bed-occupancy tick per tick delivered by a [`TickSource`].
//!
//! The lock is held only for one store operation at a time, never across a
//! network call or a wait for the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hospital_core::{Doctor, EmergencyStatus, HospitalStore, Nurse, StoreOverview};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::api::{ApiClient, ApiError};

/// Tick cadence for the telemetry simulation.
///
/// `IntervalTicks` waits on a real timer; `ManualTicks` lets a test (or a
/// command) deliver ticks explicitly.
#[async_trait]
pub trait TickSource: Send {
    /// Waits for the next tick.  Returns `false` when the source is
    /// exhausted.
    async fn next_tick(&mut self) -> bool;
}

#[derive(Debug, Deserialize)]
struct DoctorsResponse {
    #[serde(default)]
    doctors: Vec<Doctor>,
}

#[derive(Debug, Deserialize)]
struct NursesResponse {
    #[serde(default)]
    nurses: Vec<Nurse>,
}

/// Counts from a staff sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffSync {
    pub doctors: usize,
    pub nurses: usize,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<Mutex<HospitalStore>>,
}

impl DashboardService {
    pub fn new(store: HospitalStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Handle to the shared store, for callers that need direct access
    /// (e.g. dispatching an ambulance).
    pub fn store(&self) -> Arc<Mutex<HospitalStore>> {
        Arc::clone(&self.store)
    }

    /// Replaces the local doctor and nurse directories with the server's.
    ///
    /// Both lists are fetched before either is applied, so a failure on the
    /// second call leaves the local directory as it was.
    pub async fn sync_staff(&self, api: &ApiClient) -> Result<StaffSync, ApiError> {
        let doctors = api.get::<DoctorsResponse>("/doctor").await?.doctors;
        let nurses = api.get::<NursesResponse>("/nurse").await?.nurses;
        let counts = StaffSync {
            doctors: doctors.len(),
            nurses: nurses.len(),
        };

        let mut store = self.store.lock().await;
        store.replace_doctors(doctors);
        store.replace_nurses(nurses);
        info!(doctors = counts.doctors, nurses = counts.nurses, "staff directory synced");
        Ok(counts)
    }

    /// Applies one telemetry tick per tick from `ticks` until the source is
    /// exhausted or `running` is cleared.  Returns the number of ticks
    /// applied.
    pub async fn run_simulation<T, R>(
        &self,
        ticks: &mut T,
        rng: &mut R,
        running: &AtomicBool,
    ) -> u64
    where
        T: TickSource + ?Sized,
        R: Rng + Send,
    {
        let mut applied = 0u64;
        while running.load(Ordering::Relaxed) {
            if !ticks.next_tick().await {
                break;
            }
            if !running.load(Ordering::Relaxed) {
                break;
            }

            let status = {
                let mut store = self.store.lock().await;
                let before = store.emergency_status();
                let status = store.simulate_tick(rng);
                if status != before {
                    info!(from = ?before, to = ?status, "emergency status changed");
                }
                status
            };
            applied += 1;
            debug!(tick = applied, ?status, "telemetry tick applied");
        }
        applied
    }

    pub async fn overview(&self) -> StoreOverview {
        self.store.lock().await.overview()
    }

    pub async fn emergency_status(&self) -> EmergencyStatus {
        self.store.lock().await.emergency_status()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
