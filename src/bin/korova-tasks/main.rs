//! korova-tasks CLI - build orchestration for the Korova app

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Session;
use korova_tasks::util::TaskError;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            if let Some(help) = e.downcast_ref::<TaskError>().and_then(TaskError::help) {
                eprintln!("{}", help);
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over the flags
    let default_filter = if cli.verbose {
        "korova_tasks=debug"
    } else if cli.quiet {
        "korova_tasks=warn"
    } else {
        "korova_tasks=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let session = Session::new(&cli)?;

    // Execute command
    match cli.command {
        Commands::Bootstrap => commands::bootstrap::execute(&session),
        Commands::InstallDeps => commands::bootstrap::install_deps(&session),
        Commands::Configure => commands::build::configure(&session),
        Commands::Build(args) => commands::build::execute(&session, args),
        Commands::Run => commands::build::run(&session),
        Commands::Clean => commands::clean::execute(&session),
        Commands::Rebuild(args) => commands::build::rebuild(&session, args),
        Commands::Test(args) => commands::test::execute(&session, args),
        Commands::Lint(args) => commands::lint::execute(&session, args),
        Commands::Doctor(args) => commands::doctor::execute(&session, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
