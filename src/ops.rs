//! Process execution for external version control tools.
//!
//! - [`runner`]: the [`runner::Runner`] trait and its real, process-spawning
//!   implementation, with a mock for tests.

pub mod runner;
