//! Bollard-backed [`SandboxRuntime`] implementation.

use std::collections::HashMap;

use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding, PortMap};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, InspectContainerOptions,
    LogsOptionsBuilder, StartContainerOptions,
};
use futures_util::TryStreamExt;
use tracing::{debug, info};

use super::{ContainerSpec, ContainerStatus, RuntimeFuture, SandboxRuntime};
use crate::engine::connection::is_not_found;
use crate::engine::{CommandResult, EngineConnector, ExecRequest};
use crate::error::{ContainerError, DevcellError};

/// Sandbox runtime talking to Docker or Podman through Bollard.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Wrap an engine connection, typically from [`EngineConnector`].
    #[must_use]
    pub const fn new(docker: Docker) -> Self {
        Self { docker }
    }

    async fn image_exists_async(&self, image: &str) -> Result<bool, DevcellError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(error) if is_not_found(&error) => Ok(false),
            Err(error) => Err(image_failed(image, &error)),
        }
    }

    async fn pull_image_async(&self, image: &str) -> Result<(), DevcellError> {
        let (from_image, tag) = split_image_reference(image);
        info!(image, "pulling sandbox image");
        self.docker
            .create_image(
                Some(
                    CreateImageOptionsBuilder::new()
                        .from_image(from_image)
                        .tag(tag)
                        .build(),
                ),
                None,
                None,
            )
            .try_collect::<Vec<_>>()
            .await
            .map_err(|error| image_failed(image, &error))?;
        Ok(())
    }

    async fn get_container_async(
        &self,
        name: &str,
    ) -> Result<Option<ContainerStatus>, DevcellError> {
        let inspect = match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => inspect,
            Err(error) if is_not_found(&error) => return Ok(None),
            Err(error) => {
                return Err(DevcellError::from(ContainerError::InspectFailed {
                    container_id: String::from(name),
                    message: error.to_string(),
                }));
            }
        };

        Ok(Some(ContainerStatus {
            id: inspect.id.unwrap_or_else(|| String::from(name)),
            name: String::from(name),
            running: inspect
                .state
                .and_then(|state| state.running)
                .unwrap_or(false),
        }))
    }

    async fn run_container_async(&self, spec: &ContainerSpec) -> Result<String, DevcellError> {
        let options = CreateContainerOptionsBuilder::new().name(&spec.name).build();
        let created = self
            .docker
            .create_container(Some(options), build_create_body(spec))
            .await
            .map_err(|error| {
                DevcellError::from(ContainerError::CreateFailed {
                    message: error.to_string(),
                })
            })?;
        debug!(container = %created.id, name = %spec.name, "created sandbox container");
        self.start_container_async(&created.id).await?;
        Ok(created.id)
    }

    async fn start_container_async(&self, container_id: &str) -> Result<(), DevcellError> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions>)
            .await
            .map_err(|error| {
                DevcellError::from(ContainerError::StartFailed {
                    container_id: String::from(container_id),
                    message: error.to_string(),
                })
            })
    }

    async fn port_mapping_async(
        &self,
        container_id: &str,
        container_port: u16,
    ) -> Result<Option<u16>, DevcellError> {
        let inspect = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(|error| {
                DevcellError::from(ContainerError::InspectFailed {
                    container_id: String::from(container_id),
                    message: error.to_string(),
                })
            })?;

        Ok(inspect
            .network_settings
            .and_then(|settings| settings.ports)
            .and_then(|ports| published_host_port(&ports, container_port)))
    }

    async fn logs_async(&self, container_id: &str, tail: usize) -> Result<String, DevcellError> {
        let options = LogsOptionsBuilder::new()
            .stdout(true)
            .stderr(true)
            .tail(&tail.to_string())
            .build();
        let chunks = self
            .docker
            .logs(container_id, Some(options))
            .try_collect::<Vec<_>>()
            .await
            .map_err(|error| {
                if is_not_found(&error) {
                    DevcellError::from(ContainerError::NotFound {
                        container_id: String::from(container_id),
                    })
                } else {
                    DevcellError::from(ContainerError::LogsFailed {
                        container_id: String::from(container_id),
                        message: error.to_string(),
                    })
                }
            })?;

        let bytes: Vec<u8> = chunks
            .into_iter()
            .flat_map(|chunk| chunk.into_bytes())
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl SandboxRuntime for DockerRuntime {
    fn image_exists(&self, image: &str) -> RuntimeFuture<'_, bool> {
        let image_owned = String::from(image);
        Box::pin(async move { self.image_exists_async(&image_owned).await })
    }

    fn pull_image(&self, image: &str) -> RuntimeFuture<'_, ()> {
        let image_owned = String::from(image);
        Box::pin(async move { self.pull_image_async(&image_owned).await })
    }

    fn get_container(&self, name: &str) -> RuntimeFuture<'_, Option<ContainerStatus>> {
        let name_owned = String::from(name);
        Box::pin(async move { self.get_container_async(&name_owned).await })
    }

    fn run_container(&self, spec: &ContainerSpec) -> RuntimeFuture<'_, String> {
        let spec_owned = spec.clone();
        Box::pin(async move { self.run_container_async(&spec_owned).await })
    }

    fn start_container(&self, container_id: &str) -> RuntimeFuture<'_, ()> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move { self.start_container_async(&container_id_owned).await })
    }

    fn exec(&self, request: &ExecRequest) -> RuntimeFuture<'_, Option<CommandResult>> {
        let request_owned = request.clone();
        Box::pin(async move { EngineConnector::exec_async(&self.docker, &request_owned).await })
    }

    fn port_mapping(
        &self,
        container_id: &str,
        container_port: u16,
    ) -> RuntimeFuture<'_, Option<u16>> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            self.port_mapping_async(&container_id_owned, container_port)
                .await
        })
    }

    fn logs(&self, container_id: &str, tail: usize) -> RuntimeFuture<'_, String> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move { self.logs_async(&container_id_owned, tail).await })
    }
}

fn image_failed(image: &str, error: &BollardError) -> DevcellError {
    DevcellError::from(ContainerError::ImagePullFailed {
        image: String::from(image),
        message: error.to_string(),
    })
}

/// Split an image reference into repository and tag, defaulting to `latest`.
///
/// A colon belonging to a registry host (`host:5000/app`) is not a tag
/// separator, and digest references are passed through untagged.
pub(super) fn split_image_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    match image.rsplit_once(':') {
        Some((repository, tag)) if !tag.contains('/') => (repository, tag),
        _ => (image, "latest"),
    }
}

pub(super) fn port_key(container_port: u16) -> String {
    format!("{container_port}/tcp")
}

/// Build the create payload: bind mount, working directory and one published port.
pub(super) fn build_create_body(spec: &ContainerSpec) -> ContainerCreateBody {
    let key = port_key(spec.container_port);
    // An empty host port asks the engine to pick a free one.
    let bindings: PortMap = HashMap::from([(
        key.clone(),
        Some(vec![PortBinding {
            host_ip: None,
            host_port: Some(String::new()),
        }]),
    )]);

    ContainerCreateBody {
        image: Some(spec.image.clone()),
        cmd: Some(spec.command.argv()),
        working_dir: Some(spec.workdir.clone()),
        exposed_ports: Some(vec![key]),
        host_config: Some(HostConfig {
            binds: Some(vec![format!("{}:{}:rw", spec.host_dir, spec.workdir)]),
            port_bindings: Some(bindings),
            ..HostConfig::default()
        }),
        ..ContainerCreateBody::default()
    }
}

/// Find the first assigned host port for `container_port/tcp`.
pub(super) fn published_host_port(ports: &PortMap, container_port: u16) -> Option<u16> {
    ports
        .get(&port_key(container_port))?
        .as_ref()?
        .iter()
        .filter_map(|binding| binding.host_port.as_deref())
        .find_map(|host_port| host_port.parse::<u16>().ok().filter(|port| *port != 0))
}
