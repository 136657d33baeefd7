use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::TaskContext;
use crate::error::{XtaskError, XtaskResult};
use crate::runner::CommandSpec;

/// Installs the bundled script as the repository's pre-commit hook.
///
/// Returns the path of the installed hook. An existing hook is overwritten.
pub async fn setup(ctx: &TaskContext<'_>) -> XtaskResult<PathBuf> {
    let source = ctx.root.join(&ctx.config.hook_source);
    if !source.is_file() {
        return Err(XtaskError::HookSourceMissing { path: source });
    }

    let hooks_dir = hooks_dir(ctx).await?;
    fs::create_dir_all(&hooks_dir).map_err(|source| XtaskError::Io {
        path: hooks_dir.clone(),
        source,
    })?;

    let hook = hooks_dir.join("pre-commit");
    fs::copy(&source, &hook).map_err(|source| XtaskError::Io {
        path: hook.clone(),
        source,
    })?;
    make_executable(&hook)?;

    info!(hook = %hook.display(), "installed pre-commit hook");
    Ok(hook)
}

/// Asks git where hooks live, which also covers worktrees and `core.hooksPath`.
async fn hooks_dir(ctx: &TaskContext<'_>) -> XtaskResult<PathBuf> {
    let command = CommandSpec::new("git")
        .args(["rev-parse", "--git-path", "hooks"])
        .current_dir(&ctx.root);
    let output = ctx.capture_checked(command).await?;

    let path = PathBuf::from(output.stdout.trim());
    Ok(if path.is_absolute() {
        path
    } else {
        ctx.root.join(path)
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> XtaskResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| XtaskError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> XtaskResult<()> {
    Ok(())
}
