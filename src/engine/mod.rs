//! Container engine connection and sandbox runtime.
//!
//! The socket endpoint is resolved through a priority-based fallback chain:
//!
//! 1. CLI argument (`--engine-socket`)
//! 2. Config file (`engine_socket` in TOML)
//! 3. `DEVCELL_ENGINE_SOCKET` environment variable
//! 4. `DOCKER_HOST` environment variable
//! 5. `CONTAINER_HOST` environment variable
//! 6. `PODMAN_HOST` environment variable
//! 7. Platform default (`/var/run/docker.sock` on Unix)
//!
//! Commands run inside sandboxes are built as [`CommandLine`] argv vectors and
//! executed through [`SandboxRuntime::exec`].

mod command;
mod connection;
mod runtime;

pub use command::CommandLine;
pub use connection::exec::{
    CommandResult, ContainerExecClient, CreateExecFuture, ExecMode, ExecRequest,
    InspectExecFuture, StartExecFuture,
};
pub use connection::{EngineConnector, SocketResolver};
#[cfg(test)]
pub(crate) use runtime::mock;
pub use runtime::{ContainerSpec, ContainerStatus, DockerRuntime, RuntimeFuture, SandboxRuntime};
