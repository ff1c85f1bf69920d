//! `configure`, `build`, `run` and `rebuild` commands

use anyhow::Result;

use super::Session;
use crate::cli::{BuildArgs, RebuildArgs};
use korova_tasks::ops::{self, BuildOptions};

pub fn configure(session: &Session) -> Result<i32> {
    ops::configure(&session.ctx, &session.runner, &session.shell)?;
    Ok(0)
}

pub fn execute(session: &Session, args: BuildArgs) -> Result<i32> {
    let opts = BuildOptions {
        run: args.run,
        clean_first: args.clean_first,
    };
    ops::build(&session.ctx, &session.runner, &session.shell, opts)
}

pub fn run(session: &Session) -> Result<i32> {
    ops::run(&session.ctx, &session.runner, &session.shell)
}

pub fn rebuild(session: &Session, args: RebuildArgs) -> Result<i32> {
    ops::rebuild(&session.ctx, &session.runner, &session.shell, args.run)
}
