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

pub const TYPE_ID: &str = "hg";

/// Mercurial adapter.
pub struct Mercurial {
    descriptor: BackendDescriptor,
}

impl Mercurial {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            descriptor: BackendDescriptor::new(TYPE_ID, ".hg", program),
        }
    }

    fn run(&self, args: &[&str]) -> Plan {
        Plan::single(self.descriptor.command().args(args.iter().copied()))
    }
}

pub fn register(registry: &mut Registry, config: &Config) {
    registry.register(Mercurial::new(config.program(TYPE_ID)));
}

impl Backend for Mercurial {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn url(&self) -> VcsResult<Query> {
        Ok(Query::first_line(
            self.descriptor.command().args(["paths", "default"]),
        ))
    }

    fn latest(&self) -> VcsResult<Query> {
        Ok(Query::first_line(self.descriptor.command().arg("revno")))
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

    // Without paths hg adds every unknown file, which is a valid request.
    fn add(&self, paths: &[String]) -> VcsResult<Plan> {
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
        Ok(self.run(&["pull", "-u"]))
    }

    fn push(&self) -> VcsResult<Plan> {
        Ok(self.run(&["push"]))
    }

    fn commit(&self, message: Option<&str>) -> VcsResult<Plan> {
        let cmd = self.descriptor.command().args(["commit", "-v"]);
        Ok(match message {
            Some(message) => Plan::single(cmd.args(["-m", message])),
            None => Plan::single(cmd).interactive(),
        })
    }

    fn export(&self, directory: &Path, _name: &str) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor.command().arg("archive").path_arg(directory),
        ))
    }

    fn archive(&self, directory: &Path, name: &str) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["archive", "-p", name, "-t", "zip"])
                .arg(zip_path(directory, name)),
        ))
    }

    fn check(&self) -> VcsResult<Plan> {
        Ok(self.run(&["verify"]))
    }

    fn clean(&self) -> VcsResult<Plan> {
        Ok(self.run(&["purge", "-v"]))
    }

    fn purge(&self) -> VcsResult<Plan> {
        Ok(self.run(&["purge", "--all"]))
    }

    fn reset(&self) -> VcsResult<Plan> {
        Ok(self.run(&["revert", "-a"]))
    }

    fn files(&self) -> VcsResult<CommandLine> {
        Ok(self.descriptor.command().arg("manifest"))
    }
}
