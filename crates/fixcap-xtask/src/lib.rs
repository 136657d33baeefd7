//! Development task runner for fixcap.
//!
//! Backs the `just` recipes and the pre-commit hook: cross-target testing
//! under an emulator, linting, format checking and hook installation.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod tasks;

pub use error::{XtaskError, XtaskResult};
