//! Session identity and the host directory backing it.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;

use super::io_error;
use crate::error::{DevcellError, WorkspaceError};

/// One caller-visible unit of work bound to a project directory.
///
/// The project directory is `workspace_root/id`. It is created when the
/// session is opened and never deleted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    workspace_root: Utf8PathBuf,
    project_dir: Utf8PathBuf,
}

impl Session {
    /// Validate `id`, create its project directory and canonicalize both paths.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::InvalidSessionId` when `id` cannot serve as a
    /// container name and a single path component, or `WorkspaceError::Io`
    /// when the directories cannot be created or resolved.
    pub fn open(id: impl Into<String>, workspace_root: &Utf8Path) -> Result<Self, DevcellError> {
        let id_value = id.into();
        validate_session_id(&id_value)?;

        let requested_dir = workspace_root.join(&id_value);
        Dir::create_ambient_dir_all(&requested_dir, cap_std::ambient_authority())
            .map_err(|error| io_error(&requested_dir, &error))?;

        let canonical_root = workspace_root
            .canonicalize_utf8()
            .map_err(|error| io_error(workspace_root, &error))?;
        let project_dir = requested_dir
            .canonicalize_utf8()
            .map_err(|error| io_error(&requested_dir, &error))?;

        Ok(Self {
            id: id_value,
            workspace_root: canonical_root,
            project_dir,
        })
    }

    /// Return the session identifier, which is also the container name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the canonical workspace root.
    #[must_use]
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Return the canonical project directory.
    #[must_use]
    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }
}

/// Check that `id` is a non-empty run of `[A-Za-z0-9_.-]` not starting with
/// `.` or `-`.
///
/// # Errors
///
/// Returns `WorkspaceError::InvalidSessionId` describing the first problem.
pub fn validate_session_id(id: &str) -> Result<(), DevcellError> {
    let reject = |reason: &str| {
        Err(DevcellError::from(WorkspaceError::InvalidSessionId {
            id: String::from(id),
            reason: String::from(reason),
        }))
    };

    match id.chars().next() {
        None => reject("must not be empty"),
        Some('.' | '-') => reject("must not start with '.' or '-'"),
        Some(_)
            if !id
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')) =>
        {
            reject("may only contain ASCII letters, digits, '_', '.' and '-'")
        }
        Some(_) => Ok(()),
    }
}
