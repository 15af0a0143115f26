use std::fmt::Display;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::VcsError;
use crate::error::VcsResult;

// `key: value` lines as printed by `bzr info` and friends.
static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^:]+?):\s*(.*?)\s*$").unwrap());

// -----------------------------------------------------------------------------
// Types

/// A fully formed external command: program plus individually held arguments.
///
/// Arguments are passed to the child as-is and never re-split, so paths with
/// spaces, quotes or glob characters reach the tool untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdio {
    /// Capture stdout and stderr.
    Capture,
    /// Inherit the caller's terminal, for steps that may open an editor.
    Inherit,
}

/// A sequence of commands joined with logical AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<CommandLine>,
    pub stdio: Stdio,
}

/// How a single value is pulled out of a query's stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extract {
    FirstLine,
    /// Value after `key: ` on the first line containing it.
    Field(&'static str),
}

/// A command whose output is read rather than passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub command: CommandLine,
    pub extract: Extract,
}

// -----------------------------------------------------------------------------
// CommandLine impl

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }
}

impl Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Quote a word for display the way a POSIX shell would read it back.
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

// -----------------------------------------------------------------------------
// Plan impl

impl Plan {
    pub fn single(command: CommandLine) -> Self {
        Self {
            steps: vec![command],
            stdio: Stdio::Capture,
        }
    }

    pub fn and(mut self, command: CommandLine) -> Self {
        self.steps.push(command);
        self
    }

    pub fn interactive(mut self) -> Self {
        self.stdio = Stdio::Inherit;
        self
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Query impl

impl Query {
    pub fn first_line(command: CommandLine) -> Self {
        Self {
            command,
            extract: Extract::FirstLine,
        }
    }

    pub fn field(command: CommandLine, key: &'static str) -> Self {
        Self {
            command,
            extract: Extract::Field(key),
        }
    }

    /// Pull the requested value out of the query's stdout.
    pub fn extract(&self, stdout: &str) -> VcsResult<String> {
        let empty = || VcsError::EmptyResult(self.command.to_string());
        match self.extract {
            Extract::FirstLine => stdout
                .lines()
                .next()
                .map(|line| line.trim().to_string())
                .ok_or_else(empty),
            Extract::Field(key) => stdout
                .lines()
                .filter_map(|line| FIELD_RE.captures(line))
                .find(|caps| &caps[1] == key)
                .map(|caps| caps[2].to_string())
                .ok_or_else(empty),
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.extract {
            Extract::FirstLine => write!(f, "{}", self.command),
            Extract::Field(key) => write!(f, "{} [{}]", self.command, key),
        }
    }
}
