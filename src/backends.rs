//! Built-in backend adapters.
//!
//! - [`git`]: Git
//! - [`hg`]: Mercurial
//! - [`bzr`]: Bazaar
//! - [`darcs`]: Darcs
//!
//! Each module exposes a `register` function. [`register_builtin`] calls them
//! in detection-priority order.

pub mod bzr;
pub mod darcs;
pub mod git;
pub mod hg;

use crate::config::Config;
use crate::registry::Registry;

/// Register every built-in backend.
pub fn register_builtin(registry: &mut Registry, config: &Config) {
    git::register(registry, config);
    hg::register(registry, config);
    bzr::register(registry, config);
    darcs::register(registry, config);
}
