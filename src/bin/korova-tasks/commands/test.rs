//! `korova-tasks test` command

use anyhow::Result;

use super::Session;
use crate::cli::TestArgs;
use korova_tasks::ops::test;

pub fn execute(session: &Session, args: TestArgs) -> Result<i32> {
    test(
        &session.ctx,
        &session.runner,
        &session.shell,
        args.name.as_deref(),
    )
}
