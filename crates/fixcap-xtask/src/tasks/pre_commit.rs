use tracing::{info, warn};

use super::{clippy, fmt, test, TaskContext};
use crate::error::{XtaskError, XtaskResult};
use crate::runner::CommandSpec;

/// Refuses to run on a dirty working tree, then runs test, clippy and fmt in
/// order.
///
/// The checks build the working tree, so unstaged edits or untracked files
/// would make them test something other than what is being committed. Staged
/// changes are fine: they are the commit.
pub async fn pre_commit_check(ctx: &TaskContext<'_>) -> XtaskResult<()> {
    ensure_clean(ctx).await?;

    test(ctx, &[]).await?;
    clippy(ctx).await?;
    fmt(ctx).await?;

    info!("pre-commit checks passed");
    Ok(())
}

async fn ensure_clean(ctx: &TaskContext<'_>) -> XtaskResult<()> {
    let unstaged = CommandSpec::new("git")
        .args(["diff", "--name-only"])
        .current_dir(&ctx.root);
    let untracked = CommandSpec::new("git")
        .args(["ls-files", "--others", "--exclude-standard"])
        .current_dir(&ctx.root);

    let mut entries = 0;
    for command in [unstaged, untracked] {
        let output = ctx.capture_checked(command).await?;
        entries += output.stdout.lines().filter(|l| !l.trim().is_empty()).count();
    }

    if entries > 0 {
        warn!(entries, "working tree is dirty");
        return Err(XtaskError::DirtyWorkingTree { entries });
    }

    Ok(())
}
