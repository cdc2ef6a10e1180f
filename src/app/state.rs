use super::{Component, ComponentState, SitegateOrchestrator};
use std::collections::HashMap;
use tracing::debug;

impl SitegateOrchestrator {
    /// Record a lifecycle transition of the poller or the gate server
    pub async fn set_component_state(&self, component: Component, state: ComponentState) {
        self.component_states.lock().await.insert(component, state);
        debug!("{} is now {:?}", component, state);
    }

    /// `None` until [`SitegateOrchestrator::initialize`] registers the component
    pub async fn component_state(&self, component: Component) -> Option<ComponentState> {
        self.component_states.lock().await.get(&component).copied()
    }

    pub async fn component_states(&self) -> HashMap<Component, ComponentState> {
        self.component_states.lock().await.clone()
    }

    /// True once both the poller and the gate server are running
    pub async fn is_serving(&self) -> bool {
        let states = self.component_states.lock().await;
        Component::ALL
            .iter()
            .all(|component| states.get(component) == Some(&ComponentState::Running))
    }
}
