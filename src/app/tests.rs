use super::*;
use crate::config::SitegateConfig;
use crate::status::{MockStatusBackend, SiteState};
use std::sync::Arc;
use std::time::Duration;

fn create_test_config(port: u16) -> SitegateConfig {
    let mut config = SitegateConfig::default();
    config.gate.ip = "127.0.0.1".to_string();
    config.gate.port = port;
    config
}

fn orchestrator_with(remote: Arc<MockStatusBackend>, port: u16) -> SitegateOrchestrator {
    SitegateOrchestrator::with_backend(create_test_config(port), remote)
}

async fn wait_for_first_refresh(orchestrator: &SitegateOrchestrator) {
    let mut updates = orchestrator.store().subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|status| !status.loading),
    )
    .await
    .expect("first refresh timed out")
    .expect("store dropped");
}

#[test]
fn test_orchestrator_creation() {
    let orchestrator = SitegateOrchestrator::new(SitegateConfig::default()).unwrap();

    assert_eq!(orchestrator.config().gate.port, 8080);
    assert!(orchestrator.store().status().loading);
}

#[tokio::test]
async fn test_component_state_management() {
    let orchestrator = orchestrator_with(Arc::new(MockStatusBackend::new()), 0);

    // No components registered before initialize
    assert!(orchestrator.component_states().await.is_empty());
    assert_eq!(orchestrator.component_state(Component::GateServer).await, None);

    orchestrator
        .set_component_state(Component::StatusPoller, ComponentState::Starting)
        .await;
    assert_eq!(
        orchestrator.component_state(Component::StatusPoller).await,
        Some(ComponentState::Starting)
    );

    orchestrator
        .set_component_state(Component::StatusPoller, ComponentState::Running)
        .await;
    orchestrator
        .set_component_state(Component::GateServer, ComponentState::Failed)
        .await;

    let all_states = orchestrator.component_states().await;
    assert_eq!(all_states.len(), 2);
    assert_eq!(
        all_states.get(&Component::StatusPoller),
        Some(&ComponentState::Running)
    );
    assert_eq!(
        all_states.get(&Component::GateServer),
        Some(&ComponentState::Failed)
    );
    assert!(!orchestrator.is_serving().await);

    orchestrator
        .set_component_state(Component::GateServer, ComponentState::Running)
        .await;
    assert!(orchestrator.is_serving().await);
}

#[test]
fn test_shutdown_reason_exit_codes() {
    assert_eq!(ShutdownReason::Signal("SIGTERM".to_string()).exit_code(), 0);
    assert_eq!(ShutdownReason::UserRequest.exit_code(), 0);
    assert_eq!(ShutdownReason::Error("bind failed".to_string()).exit_code(), 1);
    assert_eq!(Component::GateServer.to_string(), "gate_server");
}

#[tokio::test]
async fn test_initialize_registers_components() {
    let mut orchestrator = orchestrator_with(Arc::new(MockStatusBackend::new()), 0);
    orchestrator.initialize().await.unwrap();

    let states = orchestrator.component_states().await;
    assert_eq!(states.len(), 2);
    assert!(states.values().all(|state| *state == ComponentState::Stopped));
}

#[tokio::test]
async fn test_start_polls_and_shutdown_stops_everything() {
    let remote = Arc::new(MockStatusBackend::with_status(
        SiteState::Shutdown,
        Some("Back at noon"),
    ));
    let mut orchestrator = orchestrator_with(Arc::clone(&remote), 0);

    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();
    wait_for_first_refresh(&orchestrator).await;

    let status = orchestrator.store().status();
    assert_eq!(status.state, SiteState::Shutdown);
    assert_eq!(status.maintenance_message, "Back at noon");
    assert_eq!(
        orchestrator.component_state(Component::GateServer).await,
        Some(ComponentState::Running)
    );
    assert!(orchestrator.is_serving().await);

    let exit_code = orchestrator.shutdown().await.unwrap();
    assert_eq!(exit_code, 0);

    let states = orchestrator.component_states().await;
    assert!(states.values().all(|state| *state == ComponentState::Stopped));

    // Store is back to its initial state and no further polls happen
    assert!(orchestrator.store().status().loading);
    let reads = remote.read_count();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(remote.read_count(), reads);
}

#[tokio::test]
async fn test_bind_failure_marks_gate_server_failed() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut orchestrator = orchestrator_with(Arc::new(MockStatusBackend::new()), port);
    orchestrator.initialize().await.unwrap();

    let err = orchestrator.start().await.unwrap_err();
    assert!(err.to_string().contains("gate_server"));
    assert_eq!(
        orchestrator.component_state(Component::GateServer).await,
        Some(ComponentState::Failed)
    );
    assert_eq!(
        orchestrator.component_state(Component::StatusPoller).await,
        Some(ComponentState::Running)
    );

    // The poller still stops cleanly; the failed server is skipped
    assert_eq!(orchestrator.shutdown().await.unwrap(), 0);
    assert_eq!(
        orchestrator.component_state(Component::StatusPoller).await,
        Some(ComponentState::Stopped)
    );
}

#[tokio::test]
async fn test_run_exits_on_user_request() {
    let mut orchestrator = orchestrator_with(Arc::new(MockStatusBackend::new()), 0);
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    orchestrator
        .request_shutdown(ShutdownReason::UserRequest)
        .await;
    let exit_code = tokio::time::timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("run did not return")
        .unwrap();
    assert_eq!(exit_code, 0);

    // A second run has no receiver left
    assert!(orchestrator.run().await.is_err());
}

#[tokio::test]
async fn test_error_shutdown_reports_failure_exit_code() {
    let mut orchestrator = orchestrator_with(Arc::new(MockStatusBackend::new()), 0);
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    orchestrator
        .request_shutdown(ShutdownReason::Error("boom".to_string()))
        .await;
    // Later requests are ignored
    orchestrator
        .request_shutdown(ShutdownReason::UserRequest)
        .await;

    let exit_code = orchestrator.run().await.unwrap();
    assert_eq!(exit_code, 1);
}
