//! Given/when steps for session workspace scenarios.

use std::sync::Arc;

use camino::Utf8PathBuf;
use devcell::config::AppConfig;
use devcell::sandbox::{Outcome, SandboxSettings, SessionOrchestrator, SessionRegistry};
use rstest_bdd_macros::{given, when};
use serde::Serialize;
use tempfile::TempDir;

use super::StepResult;
use super::fake_runtime::FakeRuntime;
use super::state::{LastOutcome, WorkspaceState};

type Orchestrator = SessionOrchestrator<Arc<FakeRuntime>>;

fn scenario_config(root: Utf8PathBuf) -> AppConfig {
    let mut config = AppConfig::default();
    config.workspace.root = root;
    config.sandbox.bootstrap = Some(vec![String::from("npm install")]);
    config.readiness.initial_delay_ms = 1;
    config.readiness.max_delay_ms = 2;
    config.readiness.timeout_secs = 1;
    config
}

fn install_engine(workspace_state: &WorkspaceState, engine: FakeRuntime) -> StepResult<()> {
    let temp_dir = TempDir::new().map_err(|e| format!("failed to create temp dir: {e}"))?;
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
        .map_err(|e| format!("temp dir is not UTF-8: {e}"))?;
    let tokio = tokio::runtime::Runtime::new()
        .map_err(|e| format!("failed to create runtime: {e}"))?;
    let config = scenario_config(root.clone());
    let settings =
        SandboxSettings::from_config(&config).map_err(|e| format!("invalid settings: {e}"))?;

    let engine = Arc::new(engine);
    let registry = SessionRegistry::new(root, settings, Arc::clone(&engine));

    workspace_state.temp_dir.set(Arc::new(temp_dir));
    workspace_state.tokio.set(Arc::new(tokio));
    workspace_state.engine.set(engine);
    workspace_state.registry.set(Arc::new(registry));
    Ok(())
}

/// Run `operation` against the scenario's session and record its outcome.
fn with_session<T, F>(workspace_state: &WorkspaceState, operation: F) -> StepResult<()>
where
    T: Serialize,
    F: AsyncFnOnce(&mut Orchestrator) -> Outcome<T>,
{
    let tokio = workspace_state
        .tokio
        .get()
        .ok_or_else(|| String::from("runtime should be set"))?;
    let registry = workspace_state
        .registry
        .get()
        .ok_or_else(|| String::from("registry should be set"))?;
    let id = workspace_state
        .session_id
        .get()
        .ok_or_else(|| String::from("session should be chosen"))?;

    let outcome = tokio.block_on(async {
        let shared = registry
            .orchestrator(&id)
            .await
            .map_err(|e| format!("session should open: {e}"))?;
        let mut orchestrator = shared.lock().await;
        Ok::<_, String>(operation(&mut orchestrator).await)
    })?;

    let payload = serde_json::to_value(&outcome).map_err(|e| e.to_string())?;
    workspace_state.outcome.set(LastOutcome {
        payload,
        succeeded: outcome.is_success(),
    });
    Ok(())
}

#[given("an engine without the sandbox image")]
fn given_empty_engine(workspace_state: &WorkspaceState) -> StepResult<()> {
    install_engine(workspace_state, FakeRuntime::empty())
}

#[given("an engine with a stopped container for {id}")]
fn given_stopped_container(workspace_state: &WorkspaceState, id: String) -> StepResult<()> {
    install_engine(workspace_state, FakeRuntime::with_stopped_container(&id))
}

#[given("the session {id}")]
fn given_session(workspace_state: &WorkspaceState, id: String) {
    workspace_state.session_id.set(id);
}

#[given("the acquired session {id}")]
fn given_acquired_session(workspace_state: &WorkspaceState, id: String) -> StepResult<()> {
    workspace_state.session_id.set(id);
    when_acquired(workspace_state)?;
    let acquired = workspace_state
        .outcome
        .get()
        .ok_or_else(|| String::from("acquire outcome should be set"))?;
    if acquired.succeeded {
        Ok(())
    } else {
        Err(format!("acquire failed: {}", acquired.payload))
    }
}

#[when("the sandbox is acquired")]
fn when_acquired(workspace_state: &WorkspaceState) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.acquire().await
    })
}

#[when("the file {path} is written before acquiring")]
fn when_written_before_acquiring(workspace_state: &WorkspaceState, path: String) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.write(&path, "file", Some("draft")).await
    })
}

#[when("the file {path} is written with content {content}")]
fn when_written(workspace_state: &WorkspaceState, path: String, content: String) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.write(&path, "file", Some(&content)).await
    })
}

#[when("the block {search} is replaced with {replace} in {path}")]
fn when_replaced(
    workspace_state: &WorkspaceState,
    search: String,
    replace: String,
    path: String,
) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.replace_block(&path, &search, &replace).await
    })
}

#[when("the directory {path} is listed")]
fn when_listed(workspace_state: &WorkspaceState, path: String) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.list(&path).await
    })
}

#[when("{path} is deleted")]
fn when_deleted(workspace_state: &WorkspaceState, path: String) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.delete(&path).await
    })
}

#[when("{source} is moved to {destination}")]
fn when_moved(
    workspace_state: &WorkspaceState,
    source: String,
    destination: String,
) -> StepResult<()> {
    with_session(workspace_state, async |orchestrator| {
        orchestrator.move_item(&source, &destination).await
    })
}
