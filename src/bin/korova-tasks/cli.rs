//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use korova_tasks::core::PlatformKind;
use korova_tasks::util::shell::ColorChoice;

/// korova-tasks - build, test and set up the Korova app
#[derive(Parser)]
#[command(name = "korova-tasks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Color output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Override host platform detection
    #[arg(long, global = true, hide = true, env = "KOROVA_PLATFORM")]
    pub platform: Option<PlatformKind>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the toolchain, Qt and OpenCV for this platform
    Bootstrap,

    /// Install dependencies with apt only (Linux)
    #[command(alias = "install_deps")]
    InstallDeps,

    /// Run the CMake configure step
    Configure,

    /// Build the app, configuring first if needed
    Build(BuildArgs),

    /// Run the built app
    Run,

    /// Remove the build directory and stray CMake files
    Clean,

    /// Clean, configure and build
    Rebuild(RebuildArgs),

    /// Build and run the tests
    Test(TestArgs),

    /// Check source formatting with clang-format
    Lint(LintArgs),

    /// Check the environment without changing it
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Run the app after building
    #[arg(long)]
    pub run: bool,

    /// Clean the build tree and reconfigure first
    #[arg(long)]
    pub clean_first: bool,
}

#[derive(Args)]
pub struct RebuildArgs {
    /// Run the app after building
    #[arg(long)]
    pub run: bool,
}

#[derive(Args)]
pub struct TestArgs {
    /// Run only this test binary
    pub name: Option<String>,
}

#[derive(Args)]
pub struct LintArgs {
    /// Rewrite files in place instead of reporting
    #[arg(long)]
    pub fix: bool,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
