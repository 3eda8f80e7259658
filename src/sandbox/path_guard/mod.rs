//! Containment of caller-supplied paths within a session's project directory.
//!
//! Every file operation and every in-sandbox command that names a path goes
//! through [`PathGuard`] first. Resolution follows symlinks through the part
//! of the path that exists on disk and normalizes the remainder lexically, so
//! paths to files that do not exist yet can still be checked.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use super::io_error;
use crate::error::{DevcellError, WorkspaceError};

/// Upper bound on symlinks followed while resolving one path.
const MAX_SYMLINK_HOPS: usize = 40;

/// A path proven to lie inside the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedPath {
    absolute: Utf8PathBuf,
    relative: Utf8PathBuf,
}

impl GuardedPath {
    /// Return the resolved absolute path.
    #[must_use]
    pub fn absolute(&self) -> &Utf8Path {
        &self.absolute
    }

    /// Return the path relative to the project directory; `.` for the root.
    #[must_use]
    pub fn relative(&self) -> &Utf8Path {
        &self.relative
    }

    /// Return true when this is the project directory itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.relative.as_str() == "."
    }

    /// Return the parent directory relative to the project directory.
    #[must_use]
    pub fn relative_parent(&self) -> Option<&Utf8Path> {
        self.relative
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
    }
}

/// Resolves caller paths against one canonical project directory.
#[derive(Debug, Clone, Copy)]
pub struct PathGuard<'a> {
    project_dir: &'a Utf8Path,
}

impl<'a> PathGuard<'a> {
    /// Create a guard for `project_dir`, which must already be canonical.
    #[must_use]
    pub const fn new(project_dir: &'a Utf8Path) -> Self {
        Self { project_dir }
    }

    /// Resolve `requested`, following symlinks, and require containment.
    ///
    /// Backslashes count as separators and trailing separators are ignored.
    /// Absolute inputs are accepted only when they resolve inside the
    /// project directory.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::PermissionDenied` when the resolved path lies
    /// outside the project directory, or `WorkspaceError::Io` when a symlink
    /// on the way cannot be read.
    pub fn resolve(&self, requested: &str) -> Result<GuardedPath, DevcellError> {
        let candidate = self.candidate(requested);
        let resolved = resolve_lenient(&candidate, 0)
            .map_err(|error| io_error(&candidate, &error))?;
        self.contain(requested, resolved)
    }

    /// Resolve `requested` without following a symlink in its final component.
    ///
    /// Used where the entry itself is the subject, as when deleting or moving
    /// a symlink.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::resolve`].
    pub fn resolve_entry(&self, requested: &str) -> Result<GuardedPath, DevcellError> {
        let candidate = self.candidate(requested);
        let Some(Utf8Component::Normal(name)) = candidate.components().next_back() else {
            return self.resolve(requested);
        };
        let parent = candidate.parent().unwrap_or(self.project_dir);
        let resolved_parent =
            resolve_lenient(parent, 0).map_err(|error| io_error(parent, &error))?;
        self.contain(requested, resolved_parent.join(name))
    }

    fn candidate(&self, requested: &str) -> Utf8PathBuf {
        let normalized = requested.replace('\\', "/");
        let requested_path = Utf8Path::new(&normalized);
        if requested_path.is_absolute() {
            requested_path.to_path_buf()
        } else {
            self.project_dir.join(requested_path)
        }
    }

    fn contain(&self, requested: &str, resolved: Utf8PathBuf) -> Result<GuardedPath, DevcellError> {
        let Ok(relative) = resolved.strip_prefix(self.project_dir) else {
            return Err(DevcellError::from(WorkspaceError::PermissionDenied {
                path: String::from(requested),
            }));
        };
        let relative_path = if relative.as_str().is_empty() {
            Utf8PathBuf::from(".")
        } else {
            relative.to_path_buf()
        };
        Ok(GuardedPath {
            absolute: resolved,
            relative: relative_path,
        })
    }
}

/// Canonicalize the existing prefix of `path` and normalize the rest.
///
/// Below a missing component nothing exists, so `.` and `..` are handled
/// lexically there. A `..` that climbs back to an existing directory resumes
/// following symlinks.
fn resolve_lenient(path: &Utf8Path, hops: usize) -> std::io::Result<Utf8PathBuf> {
    let mut resolved = Utf8PathBuf::new();
    let mut on_disk = true;

    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => {
                resolved.push(component.as_str());
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                resolved.pop();
                if !on_disk {
                    on_disk = resolved.symlink_metadata().is_ok();
                }
            }
            Utf8Component::Normal(name) => {
                let next = resolved.join(name);
                if !on_disk {
                    resolved = next;
                    continue;
                }
                match next.symlink_metadata() {
                    Ok(metadata) if metadata.file_type().is_symlink() => {
                        resolved = follow_symlink(&resolved, &next, hops)?;
                    }
                    Ok(_) => resolved = next,
                    Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                        on_disk = false;
                        resolved = next;
                    }
                    Err(error) => return Err(error),
                }
            }
        }
    }

    Ok(resolved)
}

fn follow_symlink(
    parent: &Utf8Path,
    link: &Utf8Path,
    hops: usize,
) -> std::io::Result<Utf8PathBuf> {
    if hops >= MAX_SYMLINK_HOPS {
        return Err(std::io::Error::other(format!(
            "too many levels of symbolic links at {link}"
        )));
    }
    let target = link.read_link_utf8()?;
    // A relative target is interpreted from the directory holding the link.
    resolve_lenient(&parent.join(target), hops + 1)
}
