use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::backend::Backend;
use crate::command::CommandLine;
use crate::command::Plan;
use crate::command::Query;
use crate::command::Stdio;
use crate::error::VcsResult;
use crate::ops::runner::Execution;
use crate::ops::runner::Invocation;
use crate::ops::runner::Runner;

/// A working copy bound to the backend that manages it.
///
/// The handle owns only its directory path; it never holds processes or file
/// handles between calls.
#[derive(Clone)]
pub struct Repository {
    backend: Arc<dyn Backend>,
    directory: PathBuf,
}

/// Where a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Inside the repository directory.
    Repository,
    /// Wherever the caller is; the command names its target explicitly.
    Explicit,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("type_id", &self.type_id())
            .field("directory", &self.directory)
            .finish()
    }
}

impl Repository {
    pub fn new(backend: Arc<dyn Backend>, directory: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            directory: directory.into(),
        }
    }

    pub fn type_id(&self) -> &'static str {
        self.backend.type_id()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Last component of the directory.
    pub fn name(&self) -> String {
        match self.directory.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.directory.display().to_string(),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.backend.detect(&self.directory)
    }
}

// -----------------------------------------------------------------------------
// Actions

impl Repository {
    pub async fn init<R: Runner>(
        &self,
        runner: &R,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.init(&self.directory)?;
        self.run_plan(runner, &plan, Scope::Explicit, out, err).await
    }

    pub async fn clone_repo<R: Runner>(
        &self,
        runner: &R,
        source: &str,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.clone_repo(source, &self.directory)?;
        self.run_plan(runner, &plan, Scope::Explicit, out, err).await
    }

    pub async fn url<R: Runner>(&self, runner: &R) -> VcsResult<String> {
        let query = self.backend.url()?;
        self.query(runner, &query).await
    }

    pub async fn latest<R: Runner>(&self, runner: &R) -> VcsResult<String> {
        let query = self.backend.latest()?;
        self.query(runner, &query).await
    }

    /// `<type_id>+<url>`, e.g. `git+https://example.org/repo.git`.
    pub async fn origin<R: Runner>(&self, runner: &R) -> VcsResult<String> {
        let url = self.url(runner).await?;
        Ok(format!("{}+{}", self.type_id(), url))
    }

    pub async fn files<R: Runner>(&self, runner: &R) -> VcsResult<Vec<String>> {
        let command = self.backend.files()?;
        let execution = self
            .execute(runner, command.clone(), Scope::Repository, Stdio::Capture)
            .await?
            .check(&command)?;
        Ok(execution.lines().map(str::to_string).collect())
    }

    pub async fn add<R: Runner>(
        &self,
        runner: &R,
        paths: &[String],
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.add(paths)?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }

    pub async fn remove<R: Runner>(
        &self,
        runner: &R,
        paths: &[String],
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.remove(paths)?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }

    pub async fn move_paths<R: Runner>(
        &self,
        runner: &R,
        paths: &[String],
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.move_paths(paths)?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }

    pub async fn commit<R: Runner>(
        &self,
        runner: &R,
        message: Option<&str>,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.commit(message)?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }

    pub async fn export<R: Runner>(
        &self,
        runner: &R,
        directory: &Path,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.export(directory, &self.name())?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }

    pub async fn archive<R: Runner>(
        &self,
        runner: &R,
        directory: &Path,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = self.backend.archive(directory, &self.name())?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }

    /// Run a plan built from the backend with no arguments, inside the
    /// repository: status, diff, pull, push, check, clean, purge, reset.
    pub async fn run_simple<R: Runner>(
        &self,
        runner: &R,
        build: impl FnOnce(&dyn Backend) -> VcsResult<Plan>,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        let plan = build(self.backend.as_ref())?;
        self.run_plan(runner, &plan, Scope::Repository, out, err).await
    }
}

// -----------------------------------------------------------------------------
// Execution helpers

impl Repository {
    async fn execute<R: Runner>(
        &self,
        runner: &R,
        command: CommandLine,
        scope: Scope,
        stdio: Stdio,
    ) -> VcsResult<Execution> {
        let cwd = match scope {
            Scope::Repository => Some(self.directory.clone()),
            Scope::Explicit => None,
        };
        runner.run(&Invocation::new(command, cwd, stdio)).await
    }

    /// Run every step in order, stopping at the first failure.
    async fn run_plan<R: Runner>(
        &self,
        runner: &R,
        plan: &Plan,
        scope: Scope,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> VcsResult<()> {
        for step in &plan.steps {
            let execution = self
                .execute(runner, step.clone(), scope, plan.stdio)
                .await?;
            out.write_all(execution.stdout.as_bytes())?;
            if !execution.success {
                debug!(command = %step, code = ?execution.code, "step failed");
            }
            // On failure stderr travels inside the error instead.
            let execution = execution.check(step)?;
            err.write_all(execution.stderr.as_bytes())?;
        }
        Ok(())
    }

    async fn query<R: Runner>(&self, runner: &R, query: &Query) -> VcsResult<String> {
        let execution = self
            .execute(runner, query.command.clone(), Scope::Repository, Stdio::Capture)
            .await?
            .check(&query.command)?;
        query.extract(&execution.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::VcsError;
    use crate::ops::runner::MockRunner;
    use crate::registry::Registry;

    fn repo(type_id: &str, dir: &str) -> Repository {
        Registry::builtin(&Config::default())
            .open(type_id, dir)
            .unwrap()
    }

    fn ok(stdout: &str) -> VcsResult<Execution> {
        Ok(Execution {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    #[test]
    fn test_name_is_last_component() {
        assert_eq!(repo("git", "/home/me/src/project").name(), "project");
        assert_eq!(repo("git", "/").name(), "/");
    }

    #[tokio::test]
    async fn test_init_passes_directory_explicitly() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.cwd.is_none() && inv.command.to_string() == "git init /tmp/r")
            .times(1)
            .returning(|_| ok(""));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        repo("git", "/tmp/r")
            .init(&runner, &mut out, &mut err)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clone_repo_passes_source_and_target() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv| {
                inv.cwd.is_none()
                    && inv.command.to_string() == "hg clone https://example.org/hg/project /tmp/r"
            })
            .times(1)
            .returning(|_| ok(""));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        repo("hg", "/tmp/r")
            .clone_repo(&runner, "https://example.org/hg/project", &mut out, &mut err)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_actions_run_inside_repository() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.cwd.as_deref() == Some(Path::new("/tmp/r")))
            .times(1)
            .returning(|_| ok("On branch main\nnothing to commit\n"));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        repo("git", "/tmp/r")
            .run_simple(&runner, |b| b.status(), &mut out, &mut err)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "On branch main\nnothing to commit\n"
        );
    }

    #[tokio::test]
    async fn test_plan_stops_at_first_failure() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.command.args == vec!["fsck"])
            .times(1)
            .returning(|_| {
                Ok(Execution {
                    success: false,
                    code: Some(2),
                    stdout: String::new(),
                    stderr: "error: object corrupt\n".to_string(),
                })
            });
        runner
            .expect_run()
            .withf(|inv| inv.command.args == vec!["gc"])
            .never();

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let result = repo("git", "/tmp/r")
            .run_simple(&runner, |b| b.check(), &mut out, &mut err)
            .await;

        match result {
            Err(VcsError::ExternalToolFailure { command, code, stderr }) => {
                assert_eq!(command, "git fsck");
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "error: object corrupt");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_latest_reads_first_line() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .returning(|_| ok("3f2a9c1e\n"));

        let latest = repo("git", "/tmp/r").latest(&runner).await.unwrap();
        assert_eq!(latest, "3f2a9c1e");
    }

    #[tokio::test]
    async fn test_latest_on_empty_output() {
        let mut runner = MockRunner::new();
        runner.expect_run().returning(|_| ok(""));

        let err = repo("git", "/tmp/r").latest(&runner).await.unwrap_err();
        assert!(matches!(err, VcsError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_origin_prefixes_type() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .returning(|_| ok("https://example.org/project.git\n"));

        let origin = repo("git", "/tmp/r").origin(&runner).await.unwrap();
        assert_eq!(origin, "git+https://example.org/project.git");
    }

    #[tokio::test]
    async fn test_bzr_url_parsed_from_info() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.command.to_string() == "bzr info")
            .returning(|_| {
                ok("Checkout (format: 2a)\nRelated branches:\n  parent branch: bzr+ssh://example.org/trunk\n")
            });

        let url = repo("bzr", "/tmp/r").url(&runner).await.unwrap();
        assert_eq!(url, "bzr+ssh://example.org/trunk");
    }

    #[tokio::test]
    async fn test_files_keeps_every_line_in_order() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .returning(|_| ok("zeta.rs\nalpha.rs\nsrc/mid.rs\n"));

        let files = repo("git", "/tmp/r").files(&runner).await.unwrap();
        assert_eq!(files, vec!["zeta.rs", "alpha.rs", "src/mid.rs"]);
    }

    #[tokio::test]
    async fn test_archive_named_after_repository() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv| {
                inv.command.to_string()
                    == "git archive --format=zip --output=/tmp/out/project.zip --prefix=project/ HEAD"
            })
            .times(1)
            .returning(|_| ok(""));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        repo("git", "/src/project")
            .archive(&runner, Path::new("/tmp/out"), &mut out, &mut err)
            .await
            .unwrap();
    }
}
