use tracing::info;

use super::TaskContext;
use crate::error::XtaskResult;
use crate::runner::CommandSpec;

/// Checks formatting with the pinned nightly rustfmt, installing it first.
///
/// Nothing is rewritten; unformatted files make the recipe fail.
pub async fn fmt(ctx: &TaskContext<'_>) -> XtaskResult<()> {
    let nightly = ctx.config.nightly.as_str();

    info!(toolchain = nightly, "installing rustfmt");
    let install = CommandSpec::new("rustup")
        .args(["toolchain", "install", nightly])
        .args(["--profile", "minimal", "--component", "rustfmt"])
        .current_dir(&ctx.root);
    ctx.run_checked(install).await?;

    info!(toolchain = nightly, "checking formatting");
    let check = ctx
        .cargo()
        .arg(format!("+{nightly}"))
        .args(["fmt", "--all", "--", "--check"]);
    ctx.run_checked(check).await?;

    Ok(())
}
