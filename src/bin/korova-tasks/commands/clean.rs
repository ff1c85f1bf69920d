//! `korova-tasks clean` command

use anyhow::Result;

use super::Session;
use korova_tasks::ops::clean;

pub fn execute(session: &Session) -> Result<i32> {
    for path in clean(&session.ctx, &session.shell)? {
        if session.shell.is_verbose() {
            session.shell.detail(&path.display().to_string());
        }
    }
    Ok(0)
}
