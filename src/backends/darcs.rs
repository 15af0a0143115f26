use std::path::Path;

use crate::backend::Backend;
use crate::backend::BackendDescriptor;
use crate::backend::not_supported;
use crate::backend::require_paths;
use crate::backend::zip_path;
use crate::command::CommandLine;
use crate::command::Plan;
use crate::command::Query;
use crate::config::Config;
use crate::error::VcsResult;
use crate::registry::Registry;

pub const TYPE_ID: &str = "darcs";

const CLEAN_TREE: [&str; 5] = ["clean-tree", "-v", "--force", "--detritus", "--unknown"];

/// Darcs adapter.
pub struct Darcs {
    descriptor: BackendDescriptor,
}

impl Darcs {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            descriptor: BackendDescriptor::new(TYPE_ID, "_darcs", program),
        }
    }

    fn run(&self, args: &[&str]) -> Plan {
        Plan::single(self.descriptor.command().args(args.iter().copied()))
    }
}

pub fn register(registry: &mut Registry, config: &Config) {
    registry.register(Darcs::new(config.program(TYPE_ID)));
}

impl Backend for Darcs {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn url(&self) -> VcsResult<Query> {
        Ok(Query::field(
            self.descriptor.command().arg("info"),
            "parent branch",
        ))
    }

    fn latest(&self) -> VcsResult<Query> {
        Ok(Query::first_line(
            self.descriptor.command().args(["id", "-i"]),
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
                .args(["get", source])
                .path_arg(directory),
        ))
    }

    fn add(&self, paths: &[String]) -> VcsResult<Plan> {
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
                .arg("remove")
                .args(paths.iter().cloned()),
        ))
    }

    fn move_paths(&self, paths: &[String]) -> VcsResult<Plan> {
        require_paths("move", paths, 2)?;
        Ok(Plan::single(
            self.descriptor.command().arg("move").args(paths.iter().cloned()),
        ))
    }

    fn diff(&self) -> VcsResult<Plan> {
        Ok(self.run(&["diff"]))
    }

    fn status(&self) -> VcsResult<Plan> {
        Ok(self.run(&["whatsnew", "-s"]))
    }

    fn pull(&self) -> VcsResult<Plan> {
        Err(not_supported(&self.descriptor, "pull"))
    }

    fn push(&self) -> VcsResult<Plan> {
        Err(not_supported(&self.descriptor, "push"))
    }

    fn commit(&self, message: Option<&str>) -> VcsResult<Plan> {
        let cmd = self.descriptor.command().arg("commit");
        Ok(match message {
            Some(message) => Plan::single(cmd.args(["-m", message])),
            None => Plan::single(cmd).interactive(),
        })
    }

    fn export(&self, directory: &Path, name: &str) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["export", "-v"])
                .arg(format!("--root={}", name))
                .path_arg(directory),
        ))
    }

    fn archive(&self, directory: &Path, name: &str) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(["export", "-v"])
                .arg(format!("--root={}", name))
                .arg(zip_path(directory, name)),
        ))
    }

    fn check(&self) -> VcsResult<Plan> {
        Ok(self.run(&["check", "-v"]))
    }

    fn clean(&self) -> VcsResult<Plan> {
        Ok(self.run(&CLEAN_TREE))
    }

    fn purge(&self) -> VcsResult<Plan> {
        Ok(Plan::single(
            self.descriptor
                .command()
                .args(CLEAN_TREE)
                .arg("--ignored"),
        ))
    }

    fn reset(&self) -> VcsResult<Plan> {
        Ok(self.run(&["revert", "-v"]))
    }

    fn files(&self) -> VcsResult<CommandLine> {
        Ok(self.descriptor.command().args(["show", "files"]))
    }
}
