//! Integration tests for the live dashboard.
//!
//! These tests exercise `DashboardService` end-to-end: the seeded demo
//! board, `ManualTicks` driving the telemetry loop from a spawned task, and
//! ambulance dispatch through the shared store handle.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use hospital_client::application::api::ApiClient;
use hospital_client::application::dashboard::{DashboardService, StaffSync};
use hospital_client::infrastructure::scheduler::ManualTicks;
use hospital_client::infrastructure::storage::MemorySessionStore;
use hospital_client::infrastructure::transport::mock::MockHttpBackend;
use hospital_core::seed::demo_store;
use hospital_core::{
    AmbulanceStatus, FixedClock, NewAmbulanceRequest, Priority, RequestStatus,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn service() -> (DashboardService, Arc<FixedClock>) {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(start));
    (DashboardService::new(demo_store(clock.clone())), clock)
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_manual_ticks_drive_simulation_within_capacity() {
    // Arrange
    let (dashboard, _clock) = service();
    let (mut ticks, handle) = ManualTicks::channel();
    for _ in 0..50 {
        assert!(handle.tick());
    }
    drop(handle);

    // Act
    let runner = dashboard.clone();
    let applied = tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(7);
        let running = AtomicBool::new(true);
        runner.run_simulation(&mut ticks, &mut rng, &running).await
    })
    .await
    .expect("simulation task panicked");

    // Assert
    assert_eq!(applied, 50);
    let store = dashboard.store();
    let store = store.lock().await;
    for (category, beds) in store.beds().iter() {
        assert!(beds.occupied() <= beds.total(), "{category} over capacity");
        assert_eq!(beds.available(), beds.total() - beds.occupied());
    }
    assert_eq!(
        store.emergency_status(),
        hospital_core::EmergencyStatus::from_beds(&store.beds())
    );
}

#[tokio::test]
async fn test_same_seed_gives_same_board() {
    let mut boards = Vec::new();
    for _ in 0..2 {
        let (dashboard, _clock) = service();
        let (mut ticks, handle) = ManualTicks::channel();
        for _ in 0..20 {
            handle.tick();
        }
        drop(handle);
        let mut rng = StdRng::seed_from_u64(42);
        dashboard
            .run_simulation(&mut ticks, &mut rng, &AtomicBool::new(true))
            .await;
        boards.push(dashboard.overview().await);
    }

    assert_eq!(boards[0], boards[1]);
}

#[tokio::test]
async fn test_cleared_flag_stops_before_first_tick() {
    let (dashboard, _clock) = service();
    let before = dashboard.overview().await;
    let (mut ticks, handle) = ManualTicks::channel();
    handle.tick();

    let mut rng = StdRng::seed_from_u64(1);
    let applied = dashboard
        .run_simulation(&mut ticks, &mut rng, &AtomicBool::new(false))
        .await;

    assert_eq!(applied, 0);
    assert_eq!(dashboard.overview().await, before);
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_dispatch_lifecycle_through_shared_store() {
    // Arrange
    let (dashboard, clock) = service();
    let store = dashboard.store();

    // Act
    let request = store.lock().await.request_ambulance(NewAmbulanceRequest {
        patient_id: "P001".to_string(),
        patient_name: Some("John Smith".to_string()),
        pickup_location: "12 Harbour Road".to_string(),
        priority: Priority::High,
        ..NewAmbulanceRequest::default()
    });
    clock.advance(chrono::Duration::minutes(1));
    let accepted = store
        .lock()
        .await
        .accept_ambulance_request(&request.id, "AMB-001")
        .expect("AMB-001 is available");
    let on_route = dashboard.overview().await.ambulances_on_route;

    let mut guard = store.lock().await;
    for next in [
        RequestStatus::EnRoute,
        RequestStatus::Arrived,
        RequestStatus::Completed,
    ] {
        guard
            .advance_ambulance_request(&request.id, next)
            .expect("forward transition");
    }

    // Assert
    assert_eq!(request.id, "REQ-1709280000000");
    assert_eq!(accepted.assigned_ambulance_id.as_deref(), Some("AMB-001"));
    assert!(accepted.updated_at > accepted.requested_at);
    // AMB-003 starts on route in the demo fleet.
    assert_eq!(on_route, 2);
    assert_eq!(
        guard.ambulance("AMB-001").map(|a| a.status),
        Some(AmbulanceStatus::Available)
    );
    assert_eq!(
        guard.ambulance_request(&request.id).map(|r| r.status),
        Some(RequestStatus::Completed)
    );
    assert_eq!(guard.overview().open_requests, 0);
}

#[tokio::test]
async fn test_maintenance_ambulance_cannot_be_dispatched() {
    let (dashboard, _clock) = service();
    let store = dashboard.store();
    let mut guard = store.lock().await;
    let request = guard.request_ambulance(NewAmbulanceRequest {
        patient_id: "P002".to_string(),
        pickup_location: "Ward 4".to_string(),
        ..NewAmbulanceRequest::default()
    });

    let result = guard.accept_ambulance_request(&request.id, "AMB-005");

    assert!(result.is_err());
    assert_eq!(
        guard.ambulance_request(&request.id).map(|r| r.status),
        Some(RequestStatus::Pending)
    );
}

// ── Staff sync ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_staff_sync_replaces_seeded_directory() {
    // Arrange
    let (dashboard, _clock) = service();
    let backend = Arc::new(MockHttpBackend::new());
    backend.push_json(
        200,
        json!({
            "doctors": [{ "id": "D100", "name": "Dr. Grace Hopper", "department": "Cardiology" }],
            "pagination": { "page": 1, "total": 1 }
        }),
    );
    backend.push_json(200, json!({ "nurses": [] }));
    let api = ApiClient::new(
        "http://hms.test/api",
        backend.clone(),
        Arc::new(MemorySessionStore::new()),
    );

    // Act
    let counts = dashboard.sync_staff(&api).await.expect("sync succeeds");

    // Assert
    assert_eq!(counts, StaffSync { doctors: 1, nurses: 0 });
    let store = dashboard.store();
    let store = store.lock().await;
    assert_eq!(store.doctors().len(), 1);
    assert_eq!(store.doctors()[0].id, "D100");
    assert!(store.nurses().is_empty());
}
