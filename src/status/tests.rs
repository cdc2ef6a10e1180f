use super::*;
use crate::error::SitegateError;
use std::sync::Arc;
use std::time::Duration;

fn create_test_store(backend: &Arc<MockStatusBackend>) -> StatusStore {
    StatusStore::new(Arc::clone(backend) as Arc<dyn StatusBackend>)
}

/// Let spawned tasks run until the mock has seen `reads` reads
async fn wait_for_reads(backend: &MockStatusBackend, reads: usize) {
    for _ in 0..100 {
        if backend.read_count() >= reads {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {} status reads, saw {}",
        reads,
        backend.read_count()
    );
}

#[tokio::test]
async fn test_initial_status_is_optimistic_and_loading() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);

    let status = store.status();
    assert_eq!(status.state, SiteState::Running);
    assert!(status.loading);
    assert!(status.maintenance_message.is_empty());
    assert!(status.last_checked.is_none());
    assert_eq!(backend.read_count(), 0);
}

#[tokio::test]
async fn test_refresh_applies_remote_shutdown() {
    let backend = Arc::new(MockStatusBackend::with_status(
        SiteState::Shutdown,
        Some("Exam results are being published"),
    ));
    let store = create_test_store(&backend);

    let status = store.refresh().await.unwrap();

    assert_eq!(status.state, SiteState::Shutdown);
    assert_eq!(status.maintenance_message, "Exam results are being published");
    assert!(!status.loading);
    assert!(status.last_checked.is_some());
    assert_eq!(store.status(), status);
}

#[tokio::test]
async fn test_refresh_drops_message_when_running() {
    let backend = Arc::new(MockStatusBackend::with_status(
        SiteState::Running,
        Some("stale text from the API"),
    ));
    let store = create_test_store(&backend);

    let status = store.refresh().await.unwrap();

    assert_eq!(status.state, SiteState::Running);
    assert!(status.maintenance_message.is_empty());
}

#[tokio::test]
async fn test_refresh_failure_defaults_to_running() {
    let backend = Arc::new(MockStatusBackend::new());
    backend.fail_reads(Some("connection refused"));
    let store = create_test_store(&backend);

    let result = store.refresh().await;

    assert!(result.is_err());
    let status = store.status();
    assert_eq!(status.state, SiteState::Running);
    assert!(!status.loading);
    assert!(status.last_checked.is_none());
}

#[tokio::test]
async fn test_refresh_failure_keeps_confirmed_shutdown() {
    let backend = Arc::new(MockStatusBackend::with_status(
        SiteState::Shutdown,
        Some("Server migration"),
    ));
    let store = create_test_store(&backend);
    store.refresh().await.unwrap();

    backend.fail_reads(Some("timeout"));
    assert!(store.refresh().await.is_err());

    let status = store.status();
    assert_eq!(status.state, SiteState::Shutdown);
    assert_eq!(status.maintenance_message, "Server migration");
    assert!(!status.loading);
}

#[tokio::test]
async fn test_loading_never_returns_after_first_refresh() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);

    store.refresh().await.unwrap();
    backend.fail_reads(Some("flaky"));
    let _ = store.refresh().await;
    backend.fail_reads(None);
    store.enter_maintenance("Backup").await.unwrap();
    store.exit_maintenance().await.unwrap();

    assert!(!store.status().loading);
}

#[tokio::test]
async fn test_enter_maintenance_sets_shutdown_and_message() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    store.refresh().await.unwrap();

    let confirmation = store.enter_maintenance("scheduled upgrade").await.unwrap();

    assert_eq!(confirmation, "Website shut down successfully");
    let status = store.status();
    assert_eq!(status.state, SiteState::Shutdown);
    assert_eq!(status.maintenance_message, "scheduled upgrade");
    assert_eq!(backend.remote().status, SiteState::Shutdown);
}

#[tokio::test]
async fn test_enter_maintenance_rejects_blank_message_without_network_call() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);

    for message in ["", "   ", "\t\n"] {
        let err = store.enter_maintenance(message).await.unwrap_err();
        assert!(err.is_validation());
    }

    assert_eq!(backend.write_count(), 0);
    assert_eq!(store.state(), SiteState::Running);
}

#[tokio::test]
async fn test_write_failures_leave_state_untouched() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    store.refresh().await.unwrap();
    let before = store.status();

    backend.fail_writes(Some("Unauthorized"));
    let err = store.enter_maintenance("Upgrade").await.unwrap_err();
    assert!(matches!(err, SitegateError::Remote { .. }));
    assert_eq!(err.to_string(), "Unauthorized");
    assert_eq!(store.status(), before);

    backend.fail_writes(None);
    store.enter_maintenance("Upgrade").await.unwrap();
    let shut_down = store.status();

    backend.fail_writes(Some("Unauthorized"));
    assert!(store.exit_maintenance().await.is_err());
    assert_eq!(store.status(), shut_down);
}

#[tokio::test]
async fn test_exit_maintenance_is_idempotent_when_running() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    store.refresh().await.unwrap();
    let before = store.status();

    store.exit_maintenance().await.unwrap();

    assert_eq!(store.status(), before);
}

#[tokio::test]
async fn test_exit_always_clears_message() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);

    for message in ["Upgrade", "Exam week freeze", "Database repair"] {
        store.enter_maintenance(message).await.unwrap();
        store.enter_maintenance(message).await.unwrap();
        store.exit_maintenance().await.unwrap();
        assert_eq!(store.status().maintenance_message, "");
        assert_eq!(store.state(), SiteState::Running);
    }
}

#[tokio::test]
async fn test_subscribers_see_mutations() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let mut receiver = store.subscribe();

    store.enter_maintenance("Upgrade").await.unwrap();

    receiver.changed().await.unwrap();
    assert_eq!(receiver.borrow_and_update().state, SiteState::Shutdown);
}

#[tokio::test]
async fn test_reset_restores_defaults() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    store.refresh().await.unwrap();
    store.enter_maintenance("Upgrade").await.unwrap();

    store.reset();

    assert_eq!(store.status(), SiteStatus::default());
}

#[tokio::test]
async fn test_cloned_store_shares_state() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let handle = store.clone();

    handle.enter_maintenance("Upgrade").await.unwrap();

    assert!(store.status().is_shutdown());
}

#[test]
fn test_poll_intervals_follow_state() {
    let intervals = PollIntervals::default();

    assert_eq!(intervals.for_state(SiteState::Running), Duration::from_secs(60));
    assert_eq!(intervals.for_state(SiteState::Shutdown), Duration::from_secs(30));
}

#[test]
fn test_status_response_wire_format() {
    let response: StatusResponse =
        serde_json::from_str(r#"{"status":"shutdown","maintenanceMessage":"Upgrade"}"#).unwrap();
    assert_eq!(response.status, SiteState::Shutdown);
    assert_eq!(response.maintenance_message.as_deref(), Some("Upgrade"));

    let response: StatusResponse = serde_json::from_str(r#"{"status":"running"}"#).unwrap();
    assert_eq!(response.status, SiteState::Running);
    assert!(response.maintenance_message.is_none());

    let body = serde_json::to_value(TriggerRequest {
        maintenance_message: "Upgrade".to_string(),
    })
    .unwrap();
    assert_eq!(body, serde_json::json!({ "maintenanceMessage": "Upgrade" }));
}

#[tokio::test(start_paused = true)]
async fn test_read_started_before_shutdown_write_does_not_revert_it() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    store.refresh().await.unwrap();

    backend.delay_reads(Some(Duration::from_secs(5)));
    let in_flight = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    wait_for_reads(&backend, 2).await;

    store.enter_maintenance("scheduled upgrade").await.unwrap();
    assert_eq!(store.state(), SiteState::Shutdown);

    // The read answers "running" from before the write
    in_flight.await.unwrap().unwrap();

    let status = store.status();
    assert_eq!(status.state, SiteState::Shutdown);
    assert_eq!(status.maintenance_message, "scheduled upgrade");
    assert!(!status.loading);

    // A read issued after the write is applied as usual
    backend.delay_reads(None);
    store.refresh().await.unwrap();
    assert_eq!(store.state(), SiteState::Shutdown);
    assert_eq!(store.status().maintenance_message, "scheduled upgrade");
}

#[tokio::test(start_paused = true)]
async fn test_read_started_before_restart_write_does_not_revert_it() {
    let backend = Arc::new(MockStatusBackend::with_status(
        SiteState::Shutdown,
        Some("Upgrade"),
    ));
    let store = create_test_store(&backend);

    backend.delay_reads(Some(Duration::from_secs(5)));
    let in_flight = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    wait_for_reads(&backend, 1).await;

    store.exit_maintenance().await.unwrap();
    in_flight.await.unwrap().unwrap();

    let status = store.status();
    assert_eq!(status.state, SiteState::Running);
    assert!(status.maintenance_message.is_empty());
    // The first attempt still ends loading even though its answer was dropped
    assert!(!status.loading);
}

#[tokio::test(start_paused = true)]
async fn test_poller_keeps_shutdown_cadence_after_stale_read() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let poller = StatusPoller::new(store.clone(), PollIntervals::default());

    backend.delay_reads(Some(Duration::from_secs(5)));
    poller.start().await.unwrap();
    wait_for_reads(&backend, 1).await;

    store.enter_maintenance("scheduled upgrade").await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert!(!store.status().loading);
    assert_eq!(store.state(), SiteState::Shutdown);
    assert_eq!(poller.current_interval(), Duration::from_secs(30));

    poller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poller_refreshes_immediately_on_start() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let poller = StatusPoller::new(store.clone(), PollIntervals::default());

    poller.start().await.unwrap();
    wait_for_reads(&backend, 1).await;

    assert!(!store.status().loading);
    assert!(poller.is_running());
    poller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poller_uses_running_interval() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let poller = StatusPoller::new(store.clone(), PollIntervals::default());

    poller.start().await.unwrap();
    wait_for_reads(&backend, 1).await;

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(backend.read_count(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(backend.read_count(), 2);

    poller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poller_switches_to_shutdown_interval_after_transition() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let poller = StatusPoller::new(store.clone(), PollIntervals::default());

    poller.start().await.unwrap();
    wait_for_reads(&backend, 1).await;
    assert_eq!(poller.current_interval(), Duration::from_secs(60));

    store.enter_maintenance("scheduled upgrade").await.unwrap();
    assert_eq!(poller.current_interval(), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(backend.read_count(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(backend.read_count(), 2);

    // Still shut down remotely, so the short cadence holds
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.read_count(), 3);

    poller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poller_detects_remote_restore() {
    let backend = Arc::new(MockStatusBackend::with_status(
        SiteState::Shutdown,
        Some("Upgrade"),
    ));
    let store = create_test_store(&backend);
    let poller = StatusPoller::new(store.clone(), PollIntervals::default());

    poller.start().await.unwrap();
    wait_for_reads(&backend, 1).await;
    assert!(store.status().is_shutdown());

    backend.set_remote(SiteState::Running, None);
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(backend.read_count(), 2);
    assert_eq!(store.state(), SiteState::Running);
    assert_eq!(poller.current_interval(), Duration::from_secs(60));

    poller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poller_stop_cancels_timer() {
    let backend = Arc::new(MockStatusBackend::new());
    let store = create_test_store(&backend);
    let poller = StatusPoller::new(store, PollIntervals::default());

    poller.start().await.unwrap();
    wait_for_reads(&backend, 1).await;
    poller.stop().await.unwrap();

    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(backend.read_count(), 1);
    assert!(!poller.is_running());
    assert!(poller.start().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_poller_cannot_start_twice() {
    let backend = Arc::new(MockStatusBackend::new());
    let poller = StatusPoller::new(create_test_store(&backend), PollIntervals::default());

    poller.start().await.unwrap();
    assert!(poller.start().await.is_err());

    poller.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poll_now_skips_when_refresh_in_flight() {
    let backend = Arc::new(MockStatusBackend::new());
    backend.delay_reads(Some(Duration::from_secs(5)));
    let poller = StatusPoller::new(create_test_store(&backend), PollIntervals::default());

    let (first, second) = tokio::join!(poller.poll_now(), poller.poll_now());

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(backend.read_count(), 1);

    // The guard is released once the slow read finishes
    assert!(poller.poll_now().await.is_some());
    assert_eq!(backend.read_count(), 2);
}

#[cfg(feature = "server")]
mod http {
    use super::super::*;
    use axum::{
        extract::State,
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    use crate::config::ApiConfig;
    use crate::error::SitegateError;

    type Remote = Arc<Mutex<StatusResponse>>;

    async fn status_handler(State(remote): State<Remote>) -> Json<StatusResponse> {
        Json(remote.lock().clone())
    }

    async fn trigger_handler(
        State(remote): State<Remote>,
        Json(body): Json<TriggerRequest>,
    ) -> impl IntoResponse {
        if body.maintenance_message.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Maintenance message is required" })),
            );
        }

        *remote.lock() = StatusResponse {
            status: SiteState::Shutdown,
            maintenance_message: Some(body.maintenance_message),
        };
        (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "message": "Website shut down" })),
        )
    }

    async fn restart_handler(State(remote): State<Remote>) -> impl IntoResponse {
        *remote.lock() = StatusResponse {
            status: SiteState::Running,
            maintenance_message: None,
        };
        Json(serde_json::json!({ "success": true, "message": "Website restarted" }))
    }

    async fn spawn_remote(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn backend_for(base_url: String) -> HttpStatusBackend {
        HttpStatusBackend::new(&ApiConfig {
            base_url,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn institute_api(remote: Remote) -> Router {
        Router::new()
            .route("/api/shutdown/status", get(status_handler))
            .route("/api/shutdown/trigger", post(trigger_handler))
            .route("/api/shutdown/restart", post(restart_handler))
            .with_state(remote)
    }

    #[tokio::test]
    async fn test_http_backend_round_trip_through_store() {
        let remote = Arc::new(Mutex::new(StatusResponse {
            status: SiteState::Running,
            maintenance_message: None,
        }));
        let base_url = spawn_remote(institute_api(Arc::clone(&remote))).await;
        let store = StatusStore::new(Arc::new(backend_for(base_url)));

        let status = store.refresh().await.unwrap();
        assert_eq!(status.state, SiteState::Running);

        let confirmation = store.enter_maintenance("scheduled upgrade").await.unwrap();
        assert_eq!(confirmation, "Website shut down");
        assert_eq!(
            remote.lock().maintenance_message.as_deref(),
            Some("scheduled upgrade")
        );

        let status = store.refresh().await.unwrap();
        assert_eq!(status.state, SiteState::Shutdown);
        assert_eq!(status.maintenance_message, "scheduled upgrade");

        store.exit_maintenance().await.unwrap();
        assert_eq!(remote.lock().status, SiteState::Running);
        assert_eq!(store.status().maintenance_message, "");
    }

    #[tokio::test]
    async fn test_http_backend_surfaces_error_body() {
        let app = Router::new()
            .route(
                "/api/shutdown/status",
                get(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "message": "Database unavailable" })),
                    )
                }),
            )
            .route(
                "/api/shutdown/restart",
                post(|| async { (StatusCode::FORBIDDEN, "nope") }),
            )
            .route(
                "/api/shutdown/trigger",
                post(|| async {
                    Json(serde_json::json!({ "success": false, "message": "Already shut down" }))
                }),
            );
        let backend = backend_for(spawn_remote(app).await);

        match backend.fetch_status().await {
            Err(SitegateError::Remote { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Database unavailable");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        match backend.restart().await {
            Err(SitegateError::Remote { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("403"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let err = backend.trigger_shutdown("Upgrade").await.unwrap_err();
        assert_eq!(err.to_string(), "Already shut down");
    }

    #[tokio::test]
    async fn test_http_backend_unreachable_remote() {
        // Nothing listens on port 9 (discard) locally
        let backend = backend_for("http://127.0.0.1:9/api".to_string());
        let store = StatusStore::new(Arc::new(backend));

        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, SitegateError::Http(_)));
        assert_eq!(store.state(), SiteState::Running);
        assert!(!store.status().loading);
    }
}
