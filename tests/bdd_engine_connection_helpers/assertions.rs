//! Assertion helpers for engine connection behavioural tests.

use devcell::engine::SocketResolver;
use mockable::MockEnv;
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::EngineConnectionState;

fn resolved(engine_connection_state: &EngineConnectionState) -> StepResult<String> {
    engine_connection_state
        .resolved_socket
        .get()
        .ok_or_else(|| String::from("resolved socket should be set"))
}

#[then("the resolved socket is {expected}")]
fn the_resolved_socket_is(
    engine_connection_state: &EngineConnectionState,
    expected: String,
) -> StepResult<()> {
    let socket = resolved(engine_connection_state)?;
    if socket == expected {
        Ok(())
    } else {
        Err(format!("expected socket {expected}, got {socket}"))
    }
}

#[then("the socket resolves to the platform default")]
fn the_socket_resolves_to_platform_default(
    engine_connection_state: &EngineConnectionState,
) -> StepResult<()> {
    let socket = resolved(engine_connection_state)?;
    let default = SocketResolver::<MockEnv>::default_socket();
    if socket == default {
        Ok(())
    } else {
        Err(format!("expected platform default {default}, got {socket}"))
    }
}

#[then("the connection fails as {kind}")]
fn the_connection_fails_as(
    engine_connection_state: &EngineConnectionState,
    kind: String,
) -> StepResult<()> {
    let actual = engine_connection_state
        .connection_error
        .get()
        .ok_or_else(|| String::from("connection error should be set"))?;
    let rendered = serde_json::to_value(actual).map_err(|e| e.to_string())?;
    if rendered == serde_json::Value::String(kind.clone()) {
        Ok(())
    } else {
        Err(format!("expected {kind}, got {rendered}"))
    }
}
