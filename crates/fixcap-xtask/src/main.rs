//! Entry point for `cargo xtask`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use fixcap_xtask::cli::Cli;
use fixcap_xtask::error::{Exit, XtaskError, XtaskResult};
use fixcap_xtask::logging::{self, LogConfig};
use fixcap_xtask::runner::ProcessRunner;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(LogConfig::from_verbosity(cli.verbose, cli.quiet)) {
        eprintln!("{e}");
        return e.exit_code();
    }

    match run(&cli) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

fn run(cli: &Cli) -> XtaskResult<()> {
    let root = workspace_root();
    let config = cli.load_config(&root)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(XtaskError::Runtime)?;

    runtime.block_on(cli.execute(&config, &root, &ProcessRunner))
}

/// The xtask crate lives at `<root>/crates/fixcap-xtask`.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}
