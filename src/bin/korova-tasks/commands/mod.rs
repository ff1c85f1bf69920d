//! Command implementations
//!
//! Every command returns the exit code the process ends with.

pub mod bootstrap;
pub mod build;
pub mod clean;
pub mod completions;
pub mod doctor;
pub mod lint;
pub mod test;

use anyhow::{Context, Result};

use crate::cli::Cli;
use korova_tasks::core::PlatformKind;
use korova_tasks::util::{ProjectContext, Shell, SystemRunner};

/// What every command needs: the project, the output shell and a runner.
pub struct Session {
    pub ctx: ProjectContext,
    pub shell: Shell,
    pub runner: SystemRunner,
}

impl Session {
    pub fn new(cli: &Cli) -> Result<Self> {
        let platform = cli.platform.clone().unwrap_or_else(PlatformKind::host);
        let ctx = match &cli.project_dir {
            Some(dir) => {
                let start = dir
                    .canonicalize()
                    .with_context(|| format!("cannot use project directory {}", dir.display()))?;
                ProjectContext::discover(&start, platform)?
            }
            None => ProjectContext::from_cwd(platform)?,
        };

        Ok(Session {
            ctx,
            shell: Shell::from_flags(cli.quiet, cli.verbose, cli.color),
            runner: SystemRunner,
        })
    }
}
