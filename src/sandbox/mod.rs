//! Per-session sandboxes and the guarded workspace operations over them.
//!
//! A [`Session`] names a project directory under the workspace root. A
//! [`SessionOrchestrator`] binds it to a [`SandboxRuntime`], brings the
//! container to readiness through [`LifecycleManager`] and exposes
//! [`WorkspaceOps`] behind a single error boundary.
//!
//! [`SandboxRuntime`]: crate::engine::SandboxRuntime

mod lifecycle;
mod orchestrator;
mod outcome;
mod path_guard;
mod registry;
mod session;
mod settings;
mod workspace;

use camino::Utf8Path;

pub use self::lifecycle::{
    LifecycleManager, LifecycleState, ReadinessInfo, ReadinessPolicy, SandboxHandle,
};
pub use self::orchestrator::SessionOrchestrator;
pub use self::outcome::{ErrorPayload, Outcome};
pub use self::path_guard::{GuardedPath, PathGuard};
pub use self::registry::{SessionRegistry, SharedOrchestrator};
pub use self::session::{Session, validate_session_id};
pub use self::settings::SandboxSettings;
pub use self::workspace::{
    Acknowledgement, DEFAULT_LOG_TAIL, EntryType, FileContent, FileEntry, LogTail, SearchMatch,
    WorkspaceOps, WriteKind,
};
use crate::error::{DevcellError, WorkspaceError};

fn io_error(path: &Utf8Path, error: &std::io::Error) -> DevcellError {
    DevcellError::from(WorkspaceError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}
