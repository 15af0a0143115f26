use std::path::Path;

use crate::backend::Backend;
use crate::backend::BackendDescriptor;
use crate::backend::require_paths;
use crate::backend::zip_path;
use crate::command::CommandLine;
use crate::command::Plan;
use crate::command::Query;
use crate::config::Config;
use crate::error::VcsResult;
use crate::registry::Registry;

pub const TYPE_ID: &str = "git";

/// Git adapter.
pub struct Git {
    descriptor: BackendDescriptor,
}

impl Git {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            descriptor: BackendDescriptor::new(TYPE_ID, ".git", program),
        }
    }

    fn run(&self, args: &[&str]) -> Plan {
        Plan::single(self.descriptor.command().args(args.iter().copied()))
    }
}

pub fn register(registry: &mut Registry, config: &Config) {
    registry.register(Git::new(config.program(TYPE_ID)));
}

impl Backend for Git {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn url(&self) -> VcsResult<Query> {
        Ok(Query::first_line(
            self.descriptor.command().args(["config", "remote.origin.url"]),
        ))
    }

    fn latest(&self) -> VcsResult<Query> {
        Ok(Query::first_line(
            self.descriptor.command().args(["rev-parse", "HEAD"]),
        ))
    }

    fn init(&self, directory: &Path) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor.command().arg("init").path_arg(directory),
        ))
    }

    fn clone_repo(&self, source: &str, directory: &Path) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["clone", source])
                .path_arg(directory),
        ))
    }

    fn add(&self, paths: &[String]) -> VcsResult<Plan> {
        // `git add` with no pathspec does nothing but complain.
        require_paths("add", paths, 1)?;
        Ok(Plan::single(
            self.descriptor.command().arg("add").args(paths.iter().cloned()),
        ))
    }

    fn remove(&self, paths: &[String]) -> VcsResult<Plan> {
        require_paths("remove", paths, 1)?;
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["rm", "-f"])
                .args(paths.iter().cloned()),
        ))
    }

    fn move_paths(&self, paths: &[String]) -> VcsResult<Plan> {
        require_paths("move", paths, 2)?;
        Ok(Plan::single(
            self.descriptor.command().arg("mv").args(paths.iter().cloned()),
        ))
    }

    fn diff(&self) -> VcsResult<Plan> {
        Ok(self.run(&["diff"]))
    }

    fn status(&self) -> VcsResult<Plan> {
        Ok(self.run(&["status"]))
    }

    fn pull(&self) -> VcsResult<Plan> {
        Ok(self.run(&["pull", "--recurse-submodules"]))
    }

    fn push(&self) -> VcsResult<Plan> {
        Ok(self.run(&["push"]))
    }

    fn commit(&self, message: Option<&str>) -> VcsResult<Plan> {
        let cmd = self.descriptor.command().args(["commit", "-a", "-v"]);
        Ok(match message {
            Some(message) => Plan::single(cmd.args(["-m", message])),
            None => Plan::single(cmd).interactive(),
        })
    }

    fn export(&self, directory: &Path, _name: &str) -> VcsResult<Plan> {
        let prefix = format!("--prefix={}/", directory.to_string_lossy());
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["checkout-index", "-a", "-f"])
                .arg(prefix),
        ))
    }

    fn archive(&self, directory: &Path, name: &str) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["archive", "--format=zip"])
                .arg(format!("--output={}", zip_path(directory, name)))
                .arg(format!("--prefix={}/", name))
                .arg("HEAD"),
        ))
    }

    /// Integrity check followed by garbage collection, kept as one action.
    fn check(&self) -> VcsResult<Plan> {
        Ok(self.run(&["fsck"]).and(self.descriptor.command().arg("gc")))
    }

    fn clean(&self) -> VcsResult<Plan> {
        Ok(self.run(&["clean", "-fd"]))
    }

    fn purge(&self) -> VcsResult<Plan> {
        Ok(self.run(&["clean", "-fdx"]))
    }

    fn reset(&self) -> VcsResult<Plan> {
        Ok(self.run(&["reset", "--hard", "HEAD"]))
    }

    fn files(&self) -> VcsResult<CommandLine> {
        Ok(self.descriptor.command().arg("ls-files"))
    }
}
