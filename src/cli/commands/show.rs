use anyhow::{Context, Result};

use crate::{cli::context::AppContext, infra::t, reporting::console::print_config};

/// Prints the per-user configuration, creating it from the default first if needed.
pub fn execute(ctx: &AppContext) -> Result<()> {
    let document = ctx
        .store
        .load()
        .with_context(|| t!("show.load_failed").to_string())?;
    print_config(&document, &ctx.store.config_path());
    Ok(())
}
