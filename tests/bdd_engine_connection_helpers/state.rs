//! Scenario state for engine connection behavioural tests.

use std::collections::HashMap;

use devcell::error::ErrorKind;
use mockable::MockEnv;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

#[derive(Default, ScenarioState)]
pub(crate) struct EngineConnectionState {
    /// Variables visible to the mocked environment.
    pub(crate) env_vars: Slot<HashMap<String, String>>,
    /// Socket from configuration (CLI, file or `DEVCELL_ENGINE_SOCKET`).
    pub(crate) config_socket: Slot<Option<String>>,
    pub(crate) resolved_socket: Slot<String>,
    pub(crate) connection_error: Slot<ErrorKind>,
}

impl EngineConnectionState {
    /// Snapshot the configured variables into a `MockEnv`.
    ///
    /// Given steps finish before any When step builds the mock, so later
    /// changes are never needed.
    pub(crate) fn mock_env(&self) -> MockEnv {
        let vars = self.env_vars.get().unwrap_or_default();
        let mut mock = MockEnv::new();
        mock.expect_string()
            .returning(move |key| vars.get(key).cloned());
        mock
    }

    pub(crate) fn set_env_var(&self, key: &str, value: &str) {
        let mut vars = self.env_vars.get().unwrap_or_default();
        vars.insert(String::from(key), String::from(value));
        self.env_vars.set(vars);
    }
}

#[fixture]
pub(crate) fn engine_connection_state() -> EngineConnectionState {
    let state = EngineConnectionState::default();
    state.config_socket.set(None);
    state
}
