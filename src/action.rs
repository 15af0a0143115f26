use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::VcsError;

/// Every backend-independent operation a caller can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Actions,
    Add,
    Archive,
    Check,
    Clean,
    Clone,
    Commit,
    Diff,
    Export,
    Files,
    Init,
    Latest,
    Move,
    Origin,
    Pull,
    Purge,
    Push,
    Remove,
    Reset,
    Status,
    Url,
}

impl Action {
    pub const ALL: [Action; 21] = [
        Action::Actions,
        Action::Add,
        Action::Archive,
        Action::Check,
        Action::Clean,
        Action::Clone,
        Action::Commit,
        Action::Diff,
        Action::Export,
        Action::Files,
        Action::Init,
        Action::Latest,
        Action::Move,
        Action::Origin,
        Action::Pull,
        Action::Purge,
        Action::Push,
        Action::Remove,
        Action::Reset,
        Action::Status,
        Action::Url,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Actions => "actions",
            Action::Add => "add",
            Action::Archive => "archive",
            Action::Check => "check",
            Action::Clean => "clean",
            Action::Clone => "clone",
            Action::Commit => "commit",
            Action::Diff => "diff",
            Action::Export => "export",
            Action::Files => "files",
            Action::Init => "init",
            Action::Latest => "latest",
            Action::Move => "move",
            Action::Origin => "origin",
            Action::Pull => "pull",
            Action::Purge => "purge",
            Action::Push => "push",
            Action::Remove => "remove",
            Action::Reset => "reset",
            Action::Status => "status",
            Action::Url => "url",
        }
    }

    /// Action names, sorted.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = Self::ALL.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names
    }

    /// Whether the action creates the working copy, so the directory is not
    /// expected to be a repository yet.
    pub fn creates_repository(self) -> bool {
        matches!(self, Action::Init | Action::Clone)
    }
}

impl FromStr for Action {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rm" => return Ok(Action::Remove),
            "mv" => return Ok(Action::Move),
            _ => {}
        }
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| VcsError::UnknownAction(s.to_string()))
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters shared by every action in one invocation.
#[derive(Debug, Clone, Default)]
pub struct ActionArgs {
    /// Paths for `add`, `remove` and `move`.
    pub paths: Vec<String>,
    /// Commit message; without one the tool's own default applies.
    pub message: Option<String>,
    /// Target for `export` and `archive`.
    pub output_directory: Option<PathBuf>,
    /// Source location for `clone`.
    pub source: Option<String>,
}

/// What an action produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionResult {
    /// Exit status of the external tool.
    Status(bool),
    /// A single value such as a URL or revision id.
    Line(String),
    /// Every line of a listing, in the tool's order.
    Lines(Vec<String>),
}

impl ActionResult {
    pub fn success(&self) -> bool {
        match self {
            ActionResult::Status(ok) => *ok,
            ActionResult::Line(_) | ActionResult::Lines(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_name() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("rm".parse::<Action>().unwrap(), Action::Remove);
        assert_eq!("mv".parse::<Action>().unwrap(), Action::Move);
    }

    #[test]
    fn test_unknown_action() {
        let err = "frobnicate".parse::<Action>().unwrap_err();
        assert!(matches!(err, VcsError::UnknownAction(name) if name == "frobnicate"));
    }

    #[test]
    fn test_names_sorted() {
        let names = Action::names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), Action::ALL.len());
    }

    #[test]
    fn test_creating_actions() {
        let creating: Vec<_> = Action::ALL
            .into_iter()
            .filter(|a| a.creates_repository())
            .collect();
        assert_eq!(creating, vec![Action::Clone, Action::Init]);
    }

    #[test]
    fn test_result_json() {
        let json = serde_json::to_string(&ActionResult::Line("abc".to_string())).unwrap();
        assert_eq!(json, r#"{"kind":"line","value":"abc"}"#);
        assert!(ActionResult::Lines(vec![]).success());
        assert!(!ActionResult::Status(false).success());
    }
}
