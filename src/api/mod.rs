//! Orchestration API for devcell commands.
//!
//! This module turns one library-owned [`Operation`] into a JSON outcome for
//! a session: [`open_orchestrator`] connects to the engine and opens the
//! session, and [`perform`] acquires the sandbox and runs the operation.
//! Neither prints nor exits; the CLI adapter owns presentation.

mod connect;

use serde::Serialize;
use serde_json::Value;

pub use connect::open_orchestrator;

use crate::engine::SandboxRuntime;
use crate::error::{DevcellError, WorkspaceError};
use crate::sandbox::{Outcome, SessionOrchestrator};

/// One caller request against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Bring the sandbox to readiness.
    Acquire,
    /// List a directory.
    List {
        /// Directory relative to the project.
        path: String,
    },
    /// Read a file.
    Read {
        /// File relative to the project.
        path: String,
        /// Render as a line-numbered table.
        annotated: bool,
    },
    /// Create a file or folder.
    Write {
        /// Path relative to the project.
        path: String,
        /// `file` or `folder`.
        kind: String,
        /// File content.
        content: Option<String>,
    },
    /// Delete a path inside the sandbox.
    Delete {
        /// Path relative to the project.
        path: String,
    },
    /// Search for a literal term.
    Search {
        /// Text to find.
        term: String,
    },
    /// Replace one exact block in a file.
    Replace {
        /// File relative to the project.
        path: String,
        /// Block to find.
        search: String,
        /// Replacement block.
        replace: String,
    },
    /// Move or rename a path.
    Move {
        /// Existing path.
        source: String,
        /// New path.
        destination: String,
    },
    /// Run a shell command.
    Run {
        /// Command passed to `sh -c`.
        command: String,
    },
    /// Run the type checker.
    Lint,
    /// Tail the container output.
    Logs {
        /// Number of lines.
        lines: usize,
    },
}

/// JSON outcome of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutput {
    /// Success payload or `{error, kind}`.
    pub payload: Value,
    /// Whether `payload` is a success payload.
    pub succeeded: bool,
}

/// Acquire the session's sandbox, then perform `operation`.
///
/// A failed acquisition is reported in place of the operation's outcome,
/// except that logs are still read from a container left behind by a failed
/// provisioning.
///
/// # Errors
///
/// Returns `WorkspaceError::Encoding` only when an outcome cannot be encoded
/// as JSON; operation failures are reported inside the payload.
pub async fn perform<R: SandboxRuntime>(
    orchestrator: &mut SessionOrchestrator<R>,
    operation: &Operation,
) -> Result<OperationOutput, DevcellError> {
    let acquired = orchestrator.acquire().await;
    if !acquired.is_success() {
        return match operation {
            Operation::Logs { lines } if orchestrator.handle().is_some() => {
                encode(&orchestrator.logs(*lines).await)
            }
            _ => encode(&acquired),
        };
    }

    match operation {
        Operation::Acquire => encode(&acquired),
        Operation::List { path } => encode(&orchestrator.list(path).await),
        Operation::Read {
            path,
            annotated: false,
        } => encode(&orchestrator.read(path).await),
        Operation::Read {
            path,
            annotated: true,
        } => encode(&orchestrator.read_annotated(path).await),
        Operation::Write {
            path,
            kind,
            content,
        } => encode(
            &orchestrator
                .write(path, kind, content.as_deref())
                .await,
        ),
        Operation::Delete { path } => encode(&orchestrator.delete(path).await),
        Operation::Search { term } => encode(&orchestrator.search(term).await),
        Operation::Replace {
            path,
            search,
            replace,
        } => encode(&orchestrator.replace_block(path, search, replace).await),
        Operation::Move {
            source,
            destination,
        } => encode(&orchestrator.move_item(source, destination).await),
        Operation::Run { command } => encode(&orchestrator.run(command).await),
        Operation::Lint => encode(&orchestrator.lint().await),
        Operation::Logs { lines } => encode(&orchestrator.logs(*lines).await),
    }
}

fn encode<T: Serialize>(outcome: &Outcome<T>) -> Result<OperationOutput, DevcellError> {
    let payload = serde_json::to_value(outcome).map_err(|error| WorkspaceError::Encoding {
        message: error.to_string(),
    })?;
    Ok(OperationOutput {
        payload,
        succeeded: outcome.is_success(),
    })
}
