//! Scenario state for session workspace behavioural tests.

use std::sync::Arc;

use devcell::sandbox::SessionRegistry;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use serde_json::Value;
use tempfile::TempDir;

use super::fake_runtime::FakeRuntime;

/// Encoded outcome of the most recent operation.
#[derive(Debug, Clone)]
pub(crate) struct LastOutcome {
    pub(crate) payload: Value,
    pub(crate) succeeded: bool,
}

#[derive(Default, ScenarioState)]
pub(crate) struct WorkspaceState {
    pub(crate) temp_dir: Slot<Arc<TempDir>>,
    pub(crate) tokio: Slot<Arc<tokio::runtime::Runtime>>,
    pub(crate) engine: Slot<Arc<FakeRuntime>>,
    pub(crate) registry: Slot<Arc<SessionRegistry<FakeRuntime>>>,
    pub(crate) session_id: Slot<String>,
    pub(crate) outcome: Slot<LastOutcome>,
}

#[fixture]
pub(crate) fn workspace_state() -> WorkspaceState {
    WorkspaceState::default()
}
