use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use tracing::instrument;
use tracing::warn;

use crate::action::Action;
use crate::action::ActionArgs;
use crate::action::ActionResult;
use crate::detect;
use crate::error::VcsError;
use crate::error::VcsResult;
use crate::ops::runner::Runner;
use crate::registry::Registry;
use crate::repository::Repository;

/// How results are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per action.
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    directory: &'a Path,
    #[serde(rename = "type")]
    type_id: &'a str,
    action: &'a str,
    result: &'a ActionResult,
}

pub struct App<'r, R: Runner> {
    pub registry: &'r Registry,
    pub runner: R,
}

impl<'r, R: Runner> App<'r, R> {
    pub fn new(registry: &'r Registry, runner: R) -> Self {
        Self {
            registry,
            runner,
        }
    }

    /// Open the repository at `directory`, falling back to `hint`.
    pub fn open(&self, directory: &Path, hint: Option<&str>) -> VcsResult<Repository> {
        detect::load(self.registry, directory, hint)
    }

    /// Every repository at or below `directory`.
    pub fn find(&self, directory: &Path) -> impl Iterator<Item = Repository> + use<'r, R> {
        detect::find(self.registry, directory)
    }

    pub fn root(&self, directory: &Path) -> Option<PathBuf> {
        detect::root(self.registry, directory)
    }
}

// -----------------------------------------------------------------------------
// Dispatch

impl<R: Runner> App<'_, R> {
    /// Invoke one action on `repo`.
    ///
    /// A non-zero exit from the tool is reported as `Status(false)` for
    /// pass-through actions, with its stderr written to `err`. Queries
    /// (`url`, `latest`, `origin`, `files`) fail with the tool's error.
    #[instrument(skip_all, fields(action = %action, directory = %repo.directory().display()))]
    pub async fn dispatch(
        &self,
        repo: &Repository,
        action: Action,
        args: &ActionArgs,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<ActionResult> {
        let runner = &self.runner;
        let outcome = match action {
            Action::Actions => {
                return Ok(ActionResult::Lines(
                    Action::names().into_iter().map(str::to_string).collect(),
                ));
            }
            Action::Url => return repo.url(runner).await.map(ActionResult::Line),
            Action::Latest => return repo.latest(runner).await.map(ActionResult::Line),
            Action::Origin => return repo.origin(runner).await.map(ActionResult::Line),
            Action::Files => return repo.files(runner).await.map(ActionResult::Lines),

            Action::Init => repo.init(runner, out, err).await,
            Action::Clone => {
                let source = args
                    .source
                    .as_deref()
                    .ok_or_else(|| VcsError::invalid_arguments("clone", "a source is required"))?;
                repo.clone_repo(runner, source, out, err).await
            }
            Action::Add => repo.add(runner, &args.paths, out, err).await,
            Action::Remove => repo.remove(runner, &args.paths, out, err).await,
            Action::Move => repo.move_paths(runner, &args.paths, out, err).await,
            Action::Commit => repo.commit(runner, args.message.as_deref(), out, err).await,
            Action::Export => {
                let directory = output_directory(action, args)?;
                repo.export(runner, &directory, out, err).await
            }
            Action::Archive => {
                let directory = output_directory(action, args)?;
                tokio::fs::create_dir_all(&directory).await?;
                repo.archive(runner, &directory, out, err).await
            }

            Action::Diff => repo.run_simple(runner, |b| b.diff(), out, err).await,
            Action::Status => repo.run_simple(runner, |b| b.status(), out, err).await,
            Action::Pull => repo.run_simple(runner, |b| b.pull(), out, err).await,
            Action::Push => repo.run_simple(runner, |b| b.push(), out, err).await,
            Action::Check => repo.run_simple(runner, |b| b.check(), out, err).await,
            Action::Clean => repo.run_simple(runner, |b| b.clean(), out, err).await,
            Action::Purge => repo.run_simple(runner, |b| b.purge(), out, err).await,
            Action::Reset => repo.run_simple(runner, |b| b.reset(), out, err).await,
        };

        match outcome {
            Ok(()) => Ok(ActionResult::Status(true)),
            Err(VcsError::ExternalToolFailure { command, stderr, .. }) => {
                warn!("{} failed", command);
                if !stderr.is_empty() {
                    writeln!(err, "{}", stderr)?;
                }
                Ok(ActionResult::Status(false))
            }
            Err(e) => Err(e),
        }
    }

    /// Run `actions` in order on `repo`, stopping at the first failure.
    ///
    /// Returns whether every action succeeded.
    pub async fn run_actions(
        &self,
        repo: &Repository,
        actions: &[Action],
        args: &ActionArgs,
        format: OutputFormat,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<bool> {
        for &action in actions {
            let result = self.dispatch(repo, action, args, out, err).await?;
            match format {
                OutputFormat::Text => match &result {
                    ActionResult::Status(_) => {}
                    ActionResult::Line(line) => writeln!(out, "{}", line)?,
                    ActionResult::Lines(lines) => {
                        for line in lines {
                            writeln!(out, "{}", line)?;
                        }
                    }
                },
                OutputFormat::Json => {
                    let report = Report {
                        directory: repo.directory(),
                        type_id: repo.type_id(),
                        action: action.name(),
                        result: &result,
                    };
                    let line = serde_json::to_string(&report)
                        .map_err(|e| VcsError::Io(std::io::Error::other(e)))?;
                    writeln!(out, "{}", line)?;
                }
            }
            if !result.success() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// The output directory, resolved against the process directory.
///
/// Tools run inside the repository, so a relative path would otherwise point
/// somewhere else.
fn output_directory(action: Action, args: &ActionArgs) -> VcsResult<PathBuf> {
    let directory = args
        .output_directory
        .as_deref()
        .ok_or_else(|| VcsError::invalid_arguments(action.name(), "an output directory is required"))?;
    Ok(std::path::absolute(directory)?)
}
