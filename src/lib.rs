pub mod action;
mod app;
pub mod backend;
pub mod backends;
pub mod command;
pub mod config;
pub mod detect;
pub mod error;
pub mod ops;
pub mod registry;
pub mod repository;
pub mod scope;

pub use action::Action;
pub use action::ActionArgs;
pub use action::ActionResult;
pub use app::App;
pub use app::OutputFormat;
pub use config::Config;
pub use error::VcsError;
pub use error::VcsResult;
pub use registry::Registry;
pub use repository::Repository;

// Disable colors for all tests to get clean output
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    colored::control::set_override(false);
}
