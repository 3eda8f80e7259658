//! In-memory container engine for session workspace scenarios.
//!
//! The fake bind-mounts nothing: commands that touch files act directly on
//! the host directory recorded when the container was created.

use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::Utf8PathBuf;
use devcell::engine::{
    CommandResult, ContainerSpec, ContainerStatus, ExecMode, ExecRequest, RuntimeFuture,
    SandboxRuntime,
};

/// Host port reported for every published container port.
pub(crate) const PUBLISHED_PORT: u16 = 49_153;

#[derive(Debug, Default)]
struct Engine {
    image_present: bool,
    container: Option<ContainerStatus>,
    host_dir: Option<Utf8PathBuf>,
    dev_server_running: bool,
    calls: Vec<String>,
}

/// Scripted engine recording every mutating call.
#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    engine: Mutex<Engine>,
}

impl FakeRuntime {
    /// Engine with no image and no containers.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Engine holding the image and a stopped container named `name`.
    pub(crate) fn with_stopped_container(name: &str) -> Self {
        Self {
            engine: Mutex::new(Engine {
                image_present: true,
                container: Some(ContainerStatus {
                    id: format!("cid-{name}"),
                    name: String::from(name),
                    running: false,
                }),
                ..Engine::default()
            }),
        }
    }

    /// Return the calls recorded so far.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attached(engine: &mut Engine, argv: &[String]) -> CommandResult {
        match argv.first().map(String::as_str) {
            Some("pgrep") => finished(i64::from(!engine.dev_server_running), ""),
            Some("rm") => {
                let removed = match (engine.host_dir.as_ref(), argv.last()) {
                    (Some(host_dir), Some(target)) => remove(&host_dir.join(target)),
                    _ => false,
                };
                finished(i64::from(!removed), "")
            }
            Some("grep") => finished(1, ""),
            Some("sh") => finished(0, &format!("ran: {}", argv.join(" "))),
            _ => finished(0, "ok\n"),
        }
    }
}

fn remove(path: &camino::Utf8Path) -> bool {
    if path.is_dir() {
        std::fs::remove_dir_all(path).is_ok()
    } else {
        std::fs::remove_file(path).is_ok() || !path.exists()
    }
}

fn finished(exit_code: i64, output: &str) -> CommandResult {
    CommandResult {
        exit_code,
        output: String::from(output),
    }
}

fn ready<'a, T: Send + 'a>(value: T) -> RuntimeFuture<'a, T> {
    Box::pin(async move { Ok(value) })
}

impl SandboxRuntime for FakeRuntime {
    fn image_exists(&self, _image: &str) -> RuntimeFuture<'_, bool> {
        ready(self.lock().image_present)
    }

    fn pull_image(&self, _image: &str) -> RuntimeFuture<'_, ()> {
        let mut engine = self.lock();
        engine.image_present = true;
        engine.calls.push(String::from("pull"));
        ready(())
    }

    fn get_container(&self, name: &str) -> RuntimeFuture<'_, Option<ContainerStatus>> {
        let status = self
            .lock()
            .container
            .clone()
            .filter(|status| status.name == name);
        ready(status)
    }

    fn run_container(&self, spec: &ContainerSpec) -> RuntimeFuture<'_, String> {
        let mut engine = self.lock();
        let id = format!("cid-{}", spec.name);
        engine.container = Some(ContainerStatus {
            id: id.clone(),
            name: spec.name.clone(),
            running: true,
        });
        engine.host_dir = Some(spec.host_dir.clone());
        engine.calls.push(String::from("create"));
        ready(id)
    }

    fn start_container(&self, _container_id: &str) -> RuntimeFuture<'_, ()> {
        let mut engine = self.lock();
        if let Some(status) = engine.container.as_mut() {
            status.running = true;
        }
        engine.dev_server_running = false;
        engine.calls.push(String::from("start"));
        ready(())
    }

    fn exec(&self, request: &ExecRequest) -> RuntimeFuture<'_, Option<CommandResult>> {
        let mut engine = self.lock();
        let argv = request.command().argv();
        let rendered = argv.join(" ");
        if request.mode() == ExecMode::Detached {
            engine.dev_server_running = true;
            engine.calls.push(format!("{rendered}&"));
            return ready(None);
        }
        engine.calls.push(rendered);
        let result = Self::attached(&mut engine, &argv);
        ready(Some(result))
    }

    fn port_mapping(
        &self,
        _container_id: &str,
        _container_port: u16,
    ) -> RuntimeFuture<'_, Option<u16>> {
        ready(Some(PUBLISHED_PORT))
    }

    fn logs(&self, _container_id: &str, tail: usize) -> RuntimeFuture<'_, String> {
        ready(format!("last {tail} lines\n"))
    }
}
