//! Capability seam over the container engine used by sandbox lifecycle code.
//!
//! [`SandboxRuntime`] names the handful of engine operations a sandbox needs.
//! [`DockerRuntime`] implements it over Bollard; tests substitute mocks.

mod docker;
#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use camino::Utf8PathBuf;

pub use self::docker::DockerRuntime;
use super::{CommandLine, CommandResult, ExecRequest};
use crate::error::DevcellError;

/// Boxed future type returned by [`SandboxRuntime`] implementors.
pub type RuntimeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DevcellError>> + Send + 'a>>;

/// Engine state of a named container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    /// Engine-assigned container identifier.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Whether the engine reports the container as running.
    pub running: bool,
}

/// Everything needed to create a sandbox container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name; also the session identifier.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Host directory bind-mounted read-write at `workdir`.
    pub host_dir: Utf8PathBuf,
    /// In-container mount point and working directory.
    pub workdir: String,
    /// TCP port published to an engine-assigned host port.
    pub container_port: u16,
    /// Long-running command keeping the container alive.
    pub command: CommandLine,
}

/// Behaviour required from a container engine to manage sandboxes.
pub trait SandboxRuntime: Send + Sync {
    /// Return whether `image` is present locally.
    fn image_exists(&self, image: &str) -> RuntimeFuture<'_, bool>;

    /// Pull `image` from its registry.
    fn pull_image(&self, image: &str) -> RuntimeFuture<'_, ()>;

    /// Look up a container by name; `None` when the engine does not know it.
    fn get_container(&self, name: &str) -> RuntimeFuture<'_, Option<ContainerStatus>>;

    /// Create and start a detached container, returning its identifier.
    fn run_container(&self, spec: &ContainerSpec) -> RuntimeFuture<'_, String>;

    /// Start an existing, stopped container.
    fn start_container(&self, container_id: &str) -> RuntimeFuture<'_, ()>;

    /// Execute a command; `None` for detached requests.
    fn exec(&self, request: &ExecRequest) -> RuntimeFuture<'_, Option<CommandResult>>;

    /// Return the host port published for `container_port/tcp`, once assigned.
    fn port_mapping(&self, container_id: &str, container_port: u16)
    -> RuntimeFuture<'_, Option<u16>>;

    /// Return the last `tail` lines of combined container output.
    fn logs(&self, container_id: &str, tail: usize) -> RuntimeFuture<'_, String>;
}

impl<T: SandboxRuntime + ?Sized> SandboxRuntime for Arc<T> {
    fn image_exists(&self, image: &str) -> RuntimeFuture<'_, bool> {
        (**self).image_exists(image)
    }

    fn pull_image(&self, image: &str) -> RuntimeFuture<'_, ()> {
        (**self).pull_image(image)
    }

    fn get_container(&self, name: &str) -> RuntimeFuture<'_, Option<ContainerStatus>> {
        (**self).get_container(name)
    }

    fn run_container(&self, spec: &ContainerSpec) -> RuntimeFuture<'_, String> {
        (**self).run_container(spec)
    }

    fn start_container(&self, container_id: &str) -> RuntimeFuture<'_, ()> {
        (**self).start_container(container_id)
    }

    fn exec(&self, request: &ExecRequest) -> RuntimeFuture<'_, Option<CommandResult>> {
        (**self).exec(request)
    }

    fn port_mapping(
        &self,
        container_id: &str,
        container_port: u16,
    ) -> RuntimeFuture<'_, Option<u16>> {
        (**self).port_mapping(container_id, container_port)
    }

    fn logs(&self, container_id: &str, tail: usize) -> RuntimeFuture<'_, String> {
        (**self).logs(container_id, tail)
    }
}
