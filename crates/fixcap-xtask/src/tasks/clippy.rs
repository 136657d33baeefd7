use tracing::info;

use super::TaskContext;
use crate::error::XtaskResult;

/// Lints every crate of the workspace with all targets and features, failing
/// on any warning.
pub async fn clippy(ctx: &TaskContext<'_>) -> XtaskResult<()> {
    info!(target = %ctx.config.target, "linting");

    let command = ctx
        .cargo()
        .arg("clippy")
        .args(["--workspace", "--all-targets", "--all-features"])
        .args(["--target", ctx.config.target.as_str()])
        .args(["--", "-D", "warnings"]);

    ctx.run_checked(command).await?;
    Ok(())
}
