//! The recipes.
//!
//! Each recipe issues one or more commands through a [`CommandRunner`] and
//! propagates the first failure.

mod clippy;
mod fmt;
mod pre_commit;
mod setup;

use std::path::{Path, PathBuf};

pub use clippy::clippy;
pub use fmt::fmt;
pub use pre_commit::pre_commit_check;
pub use setup::setup;
pub use test::test;

use crate::config::XtaskConfig;
use crate::error::XtaskResult;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

/// Everything a recipe needs to run.
pub struct TaskContext<'a> {
    pub config: &'a XtaskConfig,
    pub root: PathBuf,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> TaskContext<'a> {
    pub fn new(config: &'a XtaskConfig, root: impl AsRef<Path>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            root: root.as_ref().to_path_buf(),
            runner,
        }
    }

    /// `cargo` invoked from the workspace root.
    fn cargo(&self) -> CommandSpec {
        CommandSpec::new("cargo").current_dir(&self.root)
    }

    /// `-p <package>` for every configured package.
    fn package_args(&self) -> Vec<String> {
        self.config
            .packages
            .iter()
            .flat_map(|package| ["-p".to_string(), package.clone()])
            .collect()
    }

    async fn run_checked(&self, command: CommandSpec) -> XtaskResult<CommandOutput> {
        self.runner.run(&command).await?.check(&command)
    }

    async fn capture_checked(&self, command: CommandSpec) -> XtaskResult<CommandOutput> {
        self.runner.capture(&command).await?.check(&command)
    }
}
