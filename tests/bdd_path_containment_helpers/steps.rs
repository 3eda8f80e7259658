//! Given/when steps for path containment scenarios.

use std::sync::Arc;

use camino::Utf8PathBuf;
use devcell::sandbox::{PathGuard, Session};
use rstest_bdd_macros::{given, when};
use tempfile::TempDir;

use super::StepResult;
use super::state::{ContainmentState, Resolution};

#[given("a fresh workspace root")]
fn given_workspace_root(containment_state: &ContainmentState) -> StepResult<()> {
    let temp_dir = TempDir::new().map_err(|e| format!("failed to create temp dir: {e}"))?;
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
        .map_err(|e| format!("temp dir is not UTF-8: {e}"))?;
    containment_state.temp_dir.set(Arc::new(temp_dir));
    containment_state.workspace_root.set(root);
    Ok(())
}

#[given("a session named {id} under a fresh workspace root")]
fn given_session(containment_state: &ContainmentState, id: String) -> StepResult<()> {
    given_workspace_root(containment_state)?;
    let root = workspace_root(containment_state)?;
    let session = Session::open(id, &root).map_err(|e| format!("session should open: {e}"))?;
    containment_state.session.set(session);
    Ok(())
}

#[given("a sibling session named {id}")]
fn given_sibling_session(containment_state: &ContainmentState, id: String) -> StepResult<()> {
    let root = workspace_root(containment_state)?;
    Session::open(id, &root).map_err(|e| format!("sibling session should open: {e}"))?;
    Ok(())
}

#[cfg(unix)]
#[given("the project contains a link {name} to the workspace root")]
fn given_escaping_link(containment_state: &ContainmentState, name: String) -> StepResult<()> {
    let session = session(containment_state)?;
    std::os::unix::fs::symlink(session.workspace_root(), session.project_dir().join(&name))
        .map_err(|e| format!("failed to create link {name}: {e}"))
}

#[when("the path {path} is resolved")]
fn when_path_resolved(containment_state: &ContainmentState, path: String) -> StepResult<()> {
    let session = session(containment_state)?;
    let guard = PathGuard::new(session.project_dir());
    let resolution = match guard.resolve(&path) {
        Ok(guarded) => Resolution::Allowed(guarded.relative().to_string()),
        Err(error) => Resolution::Rejected(error.kind()),
    };
    containment_state.resolution.set(resolution);
    Ok(())
}

#[when("a session named {id} is opened")]
fn when_session_opened(containment_state: &ContainmentState, id: String) -> StepResult<()> {
    let root = workspace_root(containment_state)?;
    match Session::open(id, &root) {
        Ok(opened) => Err(format!("expected rejection, opened {}", opened.id())),
        Err(error) => {
            containment_state.open_error.set(error.kind());
            Ok(())
        }
    }
}

fn workspace_root(containment_state: &ContainmentState) -> StepResult<Utf8PathBuf> {
    containment_state
        .workspace_root
        .get()
        .ok_or_else(|| String::from("workspace root should be set"))
}

fn session(containment_state: &ContainmentState) -> StepResult<Session> {
    containment_state
        .session
        .get()
        .ok_or_else(|| String::from("session should be open"))
}
