//! Mock sandbox runtime shared by unit tests across the crate.

use mockall::mock;

use super::{ContainerSpec, ContainerStatus, RuntimeFuture, SandboxRuntime};
use crate::engine::{CommandResult, ExecRequest};

mock! {
    #[derive(Debug)]
    pub(crate) Runtime {}

    impl SandboxRuntime for Runtime {
        fn image_exists(&self, image: &str) -> RuntimeFuture<'_, bool>;
        fn pull_image(&self, image: &str) -> RuntimeFuture<'_, ()>;
        fn get_container(&self, name: &str) -> RuntimeFuture<'_, Option<ContainerStatus>>;
        fn run_container(&self, spec: &ContainerSpec) -> RuntimeFuture<'_, String>;
        fn start_container(&self, container_id: &str) -> RuntimeFuture<'_, ()>;
        fn exec(&self, request: &ExecRequest) -> RuntimeFuture<'_, Option<CommandResult>>;
        fn port_mapping(&self, container_id: &str, container_port: u16) -> RuntimeFuture<'_, Option<u16>>;
        fn logs(&self, container_id: &str, tail: usize) -> RuntimeFuture<'_, String>;
    }
}

/// Box a ready value as a runtime future.
pub(crate) fn ready<T: Send + 'static>(value: T) -> RuntimeFuture<'static, T> {
    Box::pin(async move { Ok(value) })
}

/// A finished command with the given exit code and output.
pub(crate) fn finished(exit_code: i64, output: &str) -> Option<CommandResult> {
    Some(CommandResult {
        exit_code,
        output: String::from(output),
    })
}
