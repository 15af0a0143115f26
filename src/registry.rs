use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;

use tracing::debug;

use crate::backend::Backend;
use crate::backends;
use crate::config::Config;
use crate::error::VcsError;
use crate::error::VcsResult;
use crate::repository::Repository;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Ordered mapping from backend type id to adapter.
///
/// Order is registration order and decides detection priority.
#[derive(Default, Clone)]
pub struct Registry {
    backends: Vec<Arc<dyn Backend>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in backend.
    pub fn builtin(config: &Config) -> Self {
        let mut registry = Self::new();
        backends::register_builtin(&mut registry, config);
        registry
    }

    /// Add a backend, replacing any earlier one with the same type id in place.
    pub fn register(&mut self, backend: impl Backend + 'static) {
        let backend: Arc<dyn Backend> = Arc::new(backend);
        let type_id = backend.type_id();
        match self.backends.iter_mut().find(|b| b.type_id() == type_id) {
            Some(slot) => {
                debug!(type_id, "replacing backend");
                *slot = backend;
            }
            None => {
                debug!(type_id, "registering backend");
                self.backends.push(backend);
            }
        }
    }

    pub fn resolve(&self, type_id: &str) -> VcsResult<Arc<dyn Backend>> {
        self.backends
            .iter()
            .find(|b| b.type_id() == type_id)
            .cloned()
            .ok_or_else(|| VcsError::UnknownBackendType(type_id.to_string()))
    }

    /// Bind a repository handle of `type_id` to `directory`.
    pub fn open(&self, type_id: &str, directory: impl Into<PathBuf>) -> VcsResult<Repository> {
        Ok(Repository::new(self.resolve(type_id)?, directory))
    }

    pub fn backends(&self) -> impl Iterator<Item = &Arc<dyn Backend>> {
        self.backends.iter()
    }

    pub fn type_ids(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.type_id()).collect()
    }
}

/// The process-wide registry, built from `config` on first call.
///
/// Later calls return the same registry and ignore their argument.
pub fn init_global(config: &Config) -> &'static Registry {
    GLOBAL.get_or_init(|| Registry::builtin(config))
}

/// The process-wide registry with default program names unless
/// [`init_global`] ran first.
pub fn global() -> &'static Registry {
    init_global(&Config::default())
}
