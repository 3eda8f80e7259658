//! Session facade routing every public operation through one error boundary.
//!
//! [`SessionOrchestrator`] owns a session, a runtime and the optional handle
//! to the session's container. Workspace operations fail with
//! `no_container` until [`SessionOrchestrator::acquire`] has succeeded; any
//! error or panic inside an operation is reported as an [`Outcome::Failure`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::{info, warn};

use super::lifecycle::{LifecycleManager, ReadinessInfo, SandboxHandle};
use super::outcome::Outcome;
use super::workspace::{
    Acknowledgement, FileContent, FileEntry, LogTail, SearchMatch, WorkspaceOps, WriteKind,
};
use super::{SandboxSettings, Session};
use crate::engine::{CommandResult, SandboxRuntime};
use crate::error::{DevcellError, WorkspaceError};

/// One session bound to one runtime.
pub struct SessionOrchestrator<R: SandboxRuntime> {
    session: Session,
    runtime: R,
    settings: SandboxSettings,
    handle: Option<SandboxHandle>,
}

impl<R: SandboxRuntime> SessionOrchestrator<R> {
    /// Create an orchestrator with no container acquired yet.
    #[must_use]
    pub const fn new(session: Session, runtime: R, settings: SandboxSettings) -> Self {
        Self {
            session,
            runtime,
            settings,
            handle: None,
        }
    }

    /// Return the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Return the handle of the acquired container, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<&SandboxHandle> {
        self.handle.as_ref()
    }

    /// Bring the sandbox to readiness and remember its container.
    pub async fn acquire(&mut self) -> Outcome<ReadinessInfo> {
        let manager = LifecycleManager::new(&self.runtime, &self.settings);
        let result = AssertUnwindSafe(manager.acquire(&self.session, &mut self.handle))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panicked("acquire", &*payload)));

        match &result {
            Ok(info) => info!(session = self.session.id(), url = %info.url, "sandbox acquired"),
            Err(error) => warn!(
                session = self.session.id(),
                kind = ?error.kind(),
                %error,
                "sandbox acquisition failed"
            ),
        }
        Outcome::from_result(result)
    }

    /// List the immediate children of `subpath`.
    pub async fn list(&self, subpath: &str) -> Outcome<Vec<FileEntry>> {
        self.invoke("list", |ops| async move { ops.list(subpath) })
            .await
    }

    /// Read a file.
    pub async fn read(&self, path: &str) -> Outcome<FileContent> {
        self.invoke("read", |ops| async move { ops.read(path) }).await
    }

    /// Read a file as a line-numbered Markdown table.
    pub async fn read_annotated(&self, path: &str) -> Outcome<FileContent> {
        self.invoke("read_annotated", |ops| async move {
            ops.read_annotated(path)
        })
        .await
    }

    /// Create a `file` or `folder`; any other `kind` is an invalid argument.
    pub async fn write(
        &self,
        path: &str,
        kind: &str,
        content: Option<&str>,
    ) -> Outcome<Acknowledgement> {
        self.invoke("write", |ops| async move {
            let parsed = kind.parse::<WriteKind>()?;
            ops.write(path, parsed, content)
        })
        .await
    }

    /// Recursively delete a path inside the sandbox.
    pub async fn delete(&self, path: &str) -> Outcome<Acknowledgement> {
        self.invoke("delete", |ops| async move { ops.delete(path).await })
            .await
    }

    /// Search the project for a literal term.
    pub async fn search(&self, term: &str) -> Outcome<Vec<SearchMatch>> {
        self.invoke("search", |ops| async move { ops.search(term).await })
            .await
    }

    /// Replace the single exact occurrence of `search` with `replace`.
    pub async fn replace_block(
        &self,
        path: &str,
        search: &str,
        replace: &str,
    ) -> Outcome<Acknowledgement> {
        self.invoke("replace_block", |ops| async move {
            ops.replace_block(path, search, replace)
        })
        .await
    }

    /// Move or rename a file or folder.
    pub async fn move_item(&self, source: &str, destination: &str) -> Outcome<Acknowledgement> {
        self.invoke("move", |ops| async move {
            ops.move_item(source, destination)
        })
        .await
    }

    /// Run a shell command in the sandbox workdir.
    pub async fn run(&self, command: &str) -> Outcome<CommandResult> {
        self.invoke("run", |ops| async move { ops.run(command).await })
            .await
    }

    /// Run the type-check command.
    pub async fn lint(&self) -> Outcome<CommandResult> {
        self.invoke("lint", |ops| async move { ops.lint().await })
            .await
    }

    /// Return the last `tail` lines of the container's output.
    pub async fn logs(&self, tail: usize) -> Outcome<LogTail> {
        self.invoke("logs", |ops| async move { ops.logs(tail).await })
            .await
    }

    /// Run `operation` against a bound workspace, capturing errors and panics.
    async fn invoke<'s, T, F, Fut>(&'s self, operation: &'static str, op: F) -> Outcome<T>
    where
        F: FnOnce(WorkspaceOps<'s, R>) -> Fut,
        Fut: Future<Output = Result<T, DevcellError>>,
    {
        let bound = WorkspaceOps::bind(
            &self.runtime,
            &self.session,
            &self.settings,
            self.handle.as_ref(),
        );
        let result = match bound {
            Ok(ops) => AssertUnwindSafe(async move { op(ops).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(panicked(operation, &*payload))),
            Err(error) => Err(error),
        };

        if let Err(error) = &result {
            warn!(
                session = self.session.id(),
                operation,
                kind = ?error.kind(),
                %error,
                "operation failed"
            );
        }
        Outcome::from_result(result)
    }
}

fn panicked(operation: &str, payload: &(dyn Any + Send)) -> DevcellError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|text| String::from(*text))
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("panic with non-string payload"));
    DevcellError::from(WorkspaceError::Panicked {
        operation: String::from(operation),
        message,
    })
}
