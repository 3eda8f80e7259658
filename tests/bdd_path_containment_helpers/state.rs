//! Scenario state for path containment behavioural tests.

use std::sync::Arc;

use camino::Utf8PathBuf;
use devcell::error::ErrorKind;
use devcell::sandbox::Session;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tempfile::TempDir;

/// What resolving a path produced.
#[derive(Debug, Clone)]
pub(crate) enum Resolution {
    /// The path is contained; holds its project-relative form.
    Allowed(String),
    /// The path was rejected with this kind.
    Rejected(ErrorKind),
}

#[derive(Default, ScenarioState)]
pub(crate) struct ContainmentState {
    pub(crate) temp_dir: Slot<Arc<TempDir>>,
    pub(crate) workspace_root: Slot<Utf8PathBuf>,
    pub(crate) session: Slot<Session>,
    pub(crate) resolution: Slot<Resolution>,
    pub(crate) open_error: Slot<ErrorKind>,
}

#[fixture]
pub(crate) fn containment_state() -> ContainmentState {
    ContainmentState::default()
}
