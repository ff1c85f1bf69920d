//! `korova-tasks doctor` command

use anyhow::Result;

use super::Session;
use crate::cli::DoctorArgs;
use korova_tasks::ops::{doctor, format_report};

pub fn execute(session: &Session, args: DoctorArgs) -> Result<i32> {
    let report = doctor(&session.ctx, &session.runner)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report, session.shell.is_verbose()));
    }

    // Exit with error code if required checks failed
    Ok(if report.all_required_passed() { 0 } else { 1 })
}
