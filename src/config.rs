use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;

/// Environment variable holding the per-command timeout in seconds.
pub const TIMEOUT_VAR: &str = "VCS_TIMEOUT";
/// Environment variable that makes the runner change the process directory.
pub const SCOPED_CWD_VAR: &str = "VCS_SCOPED_CWD";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Kill external commands that run longer than this.
    pub timeout: Option<Duration>,
    /// Spawn children from a scoped process directory instead of passing the
    /// directory to the child.
    pub scoped_cwd: bool,
    /// Executable overrides keyed by backend type id.
    pub programs: BTreeMap<String, String>,
}

impl Config {
    /// Load config from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build config from `(name, value)` pairs.
    ///
    /// Recognized: `VCS_TIMEOUT` (seconds), `VCS_SCOPED_CWD` (`1`/`true`) and
    /// `VCS_<TYPE>_PROGRAM`, e.g. `VCS_GIT_PROGRAM=/usr/local/bin/git`.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut config = Self::default();
        for (name, value) in vars {
            if name == TIMEOUT_VAR {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {}: {:?}", TIMEOUT_VAR, value))?;
                config.timeout = Some(Duration::from_secs(secs));
            } else if name == SCOPED_CWD_VAR {
                config.scoped_cwd = matches!(value.trim(), "1" | "true" | "yes");
            } else if let Some(type_id) = name
                .strip_prefix("VCS_")
                .and_then(|rest| rest.strip_suffix("_PROGRAM"))
            {
                if !type_id.is_empty() && !value.is_empty() {
                    config.programs.insert(type_id.to_lowercase(), value);
                }
            }
        }
        Ok(config)
    }

    /// Executable to run for a backend; the type id itself unless overridden.
    pub fn program(&self, type_id: &str) -> String {
        self.programs
            .get(type_id)
            .cloned()
            .unwrap_or_else(|| type_id.to_string())
    }

    /// Default config for tests
    pub fn default_for_tests() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            ..Self::default()
        }
    }
}
