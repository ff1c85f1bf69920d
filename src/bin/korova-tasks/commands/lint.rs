//! `korova-tasks lint` command

use anyhow::Result;

use super::Session;
use crate::cli::LintArgs;
use korova_tasks::ops::LintRunner;

pub fn execute(session: &Session, args: LintArgs) -> Result<i32> {
    let report = LintRunner::new(&session.ctx, &session.runner, &session.shell).run(args.fix)?;
    Ok(if report.is_clean() { 0 } else { 1 })
}
