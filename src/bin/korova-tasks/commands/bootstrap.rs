//! `korova-tasks bootstrap` and `korova-tasks install-deps` commands

use anyhow::{bail, Result};

use super::Session;
use korova_tasks::bootstrap;
use korova_tasks::core::dependency::required_dependencies;
use korova_tasks::util::Status;

pub fn execute(session: &Session) -> Result<i32> {
    let config = &session.ctx.config().bootstrap;
    let deps = required_dependencies(config);

    let report = bootstrap::bootstrap(
        session.ctx.platform(),
        config,
        &deps,
        &session.runner,
        &session.shell,
    )?;

    if let Some((name, reason)) = report.failure() {
        bail!("bootstrap stopped at {}: {}", name, reason);
    }

    session.shell.status(
        Status::Finished,
        format!("{} dependencies ready", report.results.len()),
    );
    Ok(0)
}

pub fn install_deps(session: &Session) -> Result<i32> {
    let config = &session.ctx.config().bootstrap;
    let deps = required_dependencies(config);

    bootstrap::install_deps(
        session.ctx.platform(),
        config,
        &deps,
        &session.runner,
        &session.shell,
    )?;

    session.shell.status(Status::Installed, "all packages");
    Ok(0)
}
