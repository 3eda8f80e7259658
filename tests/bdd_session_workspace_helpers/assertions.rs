//! Assertion helpers for session workspace behavioural tests.

use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest_bdd_macros::then;
use serde_json::{Value, json};

use super::StepResult;
use super::fake_runtime::FakeRuntime;
use super::state::{LastOutcome, WorkspaceState};

fn outcome(workspace_state: &WorkspaceState) -> StepResult<LastOutcome> {
    workspace_state
        .outcome
        .get()
        .ok_or_else(|| String::from("an operation should have run"))
}

fn engine(workspace_state: &WorkspaceState) -> StepResult<Arc<FakeRuntime>> {
    workspace_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be installed"))
}

fn project_path(workspace_state: &WorkspaceState, path: &str) -> StepResult<Utf8PathBuf> {
    let registry = workspace_state
        .registry
        .get()
        .ok_or_else(|| String::from("registry should be set"))?;
    let id = workspace_state
        .session_id
        .get()
        .ok_or_else(|| String::from("session should be chosen"))?;
    Ok(registry.workspace_root().join(id).join(path))
}

#[then("the outcome is a success")]
fn outcome_is_success(workspace_state: &WorkspaceState) -> StepResult<()> {
    let last = outcome(workspace_state)?;
    if last.succeeded {
        Ok(())
    } else {
        Err(format!("expected success, got {}", last.payload))
    }
}

#[then("the outcome kind is {kind}")]
fn outcome_kind_is(workspace_state: &WorkspaceState, kind: String) -> StepResult<()> {
    let last = outcome(workspace_state)?;
    if last.succeeded {
        return Err(format!("expected {kind}, got success {}", last.payload));
    }
    match last.payload.get("kind") {
        Some(Value::String(actual)) if *actual == kind => Ok(()),
        _ => Err(format!("expected {kind}, got {}", last.payload)),
    }
}

#[then("the sandbox is ready at {url}")]
fn sandbox_is_ready(workspace_state: &WorkspaceState, url: String) -> StepResult<()> {
    let last = outcome(workspace_state)?;
    let id = workspace_state
        .session_id
        .get()
        .ok_or_else(|| String::from("session should be chosen"))?;
    let expected = json!({ "name": id, "url": url });
    if last.payload == expected {
        Ok(())
    } else {
        Err(format!("expected {expected}, got {}", last.payload))
    }
}

#[then("the engine ran {calls}")]
fn engine_ran(workspace_state: &WorkspaceState, calls: String) -> StepResult<()> {
    let expected: Vec<String> = calls.split(", ").map(String::from).collect();
    let actual = engine(workspace_state)?.calls();
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected calls {expected:?}, got {actual:?}"))
    }
}

#[then("the last engine call was {call}")]
fn last_engine_call(workspace_state: &WorkspaceState, call: String) -> StepResult<()> {
    let calls = engine(workspace_state)?.calls();
    match calls.last() {
        Some(last) if *last == call => Ok(()),
        other => Err(format!("expected last call {call}, got {other:?}")),
    }
}

#[then("the engine created no container")]
fn engine_created_nothing(workspace_state: &WorkspaceState) -> StepResult<()> {
    let calls = engine(workspace_state)?.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no engine calls, got {calls:?}"))
    }
}

#[then("the file {path} does not exist")]
fn file_does_not_exist(workspace_state: &WorkspaceState, path: String) -> StepResult<()> {
    let target = project_path(workspace_state, &path)?;
    if target.exists() {
        Err(format!("{target} should not exist"))
    } else {
        Ok(())
    }
}

#[then("reading {path} returns {content}")]
fn reading_returns(workspace_state: &WorkspaceState, path: String, content: String) -> StepResult<()> {
    let target = project_path(workspace_state, &path)?;
    let actual =
        std::fs::read_to_string(&target).map_err(|e| format!("failed to read {target}: {e}"))?;
    if actual == content {
        Ok(())
    } else {
        Err(format!("expected {content:?}, got {actual:?}"))
    }
}
