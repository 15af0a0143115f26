//! The adapter interface every supported version-control tool implements.

use std::path::Path;

use crate::command::CommandLine;
use crate::command::Plan;
use crate::command::Query;
use crate::error::VcsError;
use crate::error::VcsResult;

/// Identifies one supported VCS type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Short stable identifier, e.g. `git`.
    pub type_id: &'static str,
    /// Hidden directory that marks a working copy, e.g. `.git`.
    pub marker: Option<&'static str>,
    /// Executable invoked for every command.
    pub program: String,
}

impl BackendDescriptor {
    pub fn new(type_id: &'static str, marker: &'static str, program: impl Into<String>) -> Self {
        Self {
            type_id,
            marker: Some(marker),
            program: program.into(),
        }
    }

    /// A command line for this backend's program.
    pub fn command(&self) -> CommandLine {
        CommandLine::new(&self.program)
    }

    /// Whether `directory` contains this backend's marker subdirectory.
    pub fn detect(&self, directory: &Path) -> bool {
        match self.marker {
            Some(marker) => directory.join(marker).is_dir(),
            None => false,
        }
    }
}

/// Translates abstract actions into command lines for one tool.
///
/// Methods only build commands; nothing here spawns a process. Builders that
/// reject their input do so before any command exists.
pub trait Backend: Send + Sync {
    fn descriptor(&self) -> &BackendDescriptor;

    fn type_id(&self) -> &'static str {
        self.descriptor().type_id
    }

    fn detect(&self, directory: &Path) -> bool {
        self.descriptor().detect(directory)
    }

    /// Configured remote location.
    fn url(&self) -> VcsResult<Query>;

    /// Identifier of the current revision.
    fn latest(&self) -> VcsResult<Query>;

    /// Create an empty working copy at `directory`.
    fn init(&self, directory: &Path) -> VcsResult<Plan>;

    /// Create a working copy at `directory` seeded from `source`.
    fn clone_repo(&self, source: &str, directory: &Path) -> VcsResult<Plan>;

    fn add(&self, paths: &[String]) -> VcsResult<Plan>;
    fn remove(&self, paths: &[String]) -> VcsResult<Plan>;
    fn move_paths(&self, paths: &[String]) -> VcsResult<Plan>;

    fn diff(&self) -> VcsResult<Plan>;
    fn status(&self) -> VcsResult<Plan>;
    fn pull(&self) -> VcsResult<Plan>;
    fn push(&self) -> VcsResult<Plan>;

    /// Record a snapshot. Without a message the tool runs interactively.
    fn commit(&self, message: Option<&str>) -> VcsResult<Plan>;

    /// Write the tree as loose files into `directory`.
    fn export(&self, directory: &Path, name: &str) -> VcsResult<Plan>;

    /// Write the tree as `<directory>/<name>.zip`.
    fn archive(&self, directory: &Path, name: &str) -> VcsResult<Plan>;

    fn check(&self) -> VcsResult<Plan>;

    /// Delete untracked files. Irreversible.
    fn clean(&self) -> VcsResult<Plan>;

    /// Delete untracked and ignored files. Irreversible.
    fn purge(&self) -> VcsResult<Plan>;

    /// Discard uncommitted modifications. Irreversible.
    fn reset(&self) -> VcsResult<Plan>;

    /// Tracked files, one per line.
    fn files(&self) -> VcsResult<CommandLine>;
}

// -----------------------------------------------------------------------------
// Helpers shared by the adapters

pub(crate) fn not_supported(descriptor: &BackendDescriptor, action: &'static str) -> VcsError {
    VcsError::NotSupported {
        backend: descriptor.type_id,
        action,
    }
}

/// Reject `paths` when fewer than `min` were given.
pub(crate) fn require_paths(action: &'static str, paths: &[String], min: usize) -> VcsResult<()> {
    if paths.len() < min {
        return Err(VcsError::invalid_arguments(
            action,
            format!("expected at least {} path(s), got {}", min, paths.len()),
        ));
    }
    Ok(())
}

/// `<directory>/<name>.zip`
pub(crate) fn zip_path(directory: &Path, name: &str) -> String {
    directory
        .join(format!("{}.zip", name))
        .to_string_lossy()
        .into_owned()
}
