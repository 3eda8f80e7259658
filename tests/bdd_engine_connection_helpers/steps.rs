//! Given/when steps for engine connection scenarios.

use devcell::engine::{EngineConnector, SocketResolver};
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::EngineConnectionState;

#[given("no engine socket is configured")]
fn no_engine_socket_configured(engine_connection_state: &EngineConnectionState) {
    engine_connection_state.config_socket.set(None);
}

#[given("engine socket is configured as {socket}")]
fn engine_socket_configured_as(engine_connection_state: &EngineConnectionState, socket: String) {
    engine_connection_state.config_socket.set(Some(socket));
}

#[given("{var} is empty")]
fn variable_is_empty(engine_connection_state: &EngineConnectionState, var: String) {
    engine_connection_state.set_env_var(&var, "");
}

#[given("{var} is set to {value}")]
fn variable_is_set_to(engine_connection_state: &EngineConnectionState, var: String, value: String) {
    engine_connection_state.set_env_var(&var, &value);
}

#[when("the socket is resolved")]
fn the_socket_is_resolved(engine_connection_state: &EngineConnectionState) {
    let env = engine_connection_state.mock_env();
    let resolver = SocketResolver::new(&env);
    let config_socket = engine_connection_state.config_socket.get().flatten();
    let socket = EngineConnector::resolve_socket(config_socket.as_deref(), &resolver);
    engine_connection_state.resolved_socket.set(socket);
}

#[when("the engine is connected and verified")]
fn engine_is_connected(engine_connection_state: &EngineConnectionState) -> StepResult<()> {
    let env = engine_connection_state.mock_env();
    let resolver = SocketResolver::new(&env);
    let config_socket = engine_connection_state.config_socket.get().flatten();

    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| format!("failed to create runtime: {e}"))?;
    let result = runtime.block_on(EngineConnector::connect_with_fallback_and_verify_async(
        config_socket.as_deref(),
        &resolver,
    ));

    match result {
        Ok(_) => Err(String::from("expected the unreachable engine to fail")),
        Err(error) => {
            engine_connection_state.connection_error.set(error.kind());
            Ok(())
        }
    }
}
