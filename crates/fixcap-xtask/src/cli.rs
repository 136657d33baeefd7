//! Command line definition.

use std::io;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use tracing::debug;

use crate::config::{ConfigError, ConfigLoader, XtaskConfig};
use crate::error::XtaskResult;
use crate::runner::CommandRunner;
use crate::tasks::{self, TaskContext};

/// Development recipes for fixcap.
///
/// Cross-compiles for the embedded target and runs the result under an
/// emulator, so the lock-free code is exercised on the architecture it is
/// written for.
#[derive(Debug, Parser)]
#[command(
    name = "xtask",
    bin_name = "cargo xtask",
    version,
    about,
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "FIXCAP_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available recipes
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the test suite on the target under the emulator
    #[command(visible_alias = "t")]
    Test {
        /// Arguments forwarded to the test binaries
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Lint the workspace with all targets and features, denying warnings
    Clippy,

    /// Check formatting with the pinned nightly rustfmt
    Fmt,

    /// Install the pre-commit hook
    Setup,

    /// Run every check against a clean working tree
    #[command(name = "pre-commit-check")]
    PreCommitCheck,
}

impl Cli {
    /// Load the configuration for the workspace at `root`.
    ///
    /// An explicitly requested file must exist; the default one is optional.
    pub fn load_config(&self, root: &Path) -> XtaskResult<XtaskConfig> {
        let loader = match &self.config {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::Read {
                        path: path.clone(),
                        source: io::Error::from(io::ErrorKind::NotFound),
                    }
                    .into());
                }
                ConfigLoader::from_file(path)
            }
            None => ConfigLoader::new(root),
        };

        debug!(path = %loader.path().display(), "loading configuration");
        let config = loader.load()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Run the selected recipe.
    pub async fn execute(
        &self,
        config: &XtaskConfig,
        root: &Path,
        runner: &dyn CommandRunner,
    ) -> XtaskResult<()> {
        let ctx = TaskContext::new(config, root, runner);

        match &self.command {
            Command::Test { args } => tasks::test(&ctx, args).await,
            Command::Clippy => tasks::clippy(&ctx).await,
            Command::Fmt => tasks::fmt(&ctx).await,
            Command::Setup => tasks::setup(&ctx).await.map(|_| ()),
            Command::PreCommitCheck => tasks::pre_commit_check(&ctx).await,
        }
    }
}
