//! CLI for detect-runner
//!
//! Provides the build step entry points:
//! - `step`: run Detect as a pipeline step
//! - `post-build`: run Detect as a freestyle post-build action
//! - `check-config`: validate the global configuration
//! - `completions`: generate shell completions

pub mod check_config;
pub mod completions;
pub mod step;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use detect_runner::{BuildResult, DownloadStrategy};
use std::path::PathBuf;

/// CLI arguments for detect-runner
#[derive(Parser, Debug)]
#[command(name = "detect-runner")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run Detect as a pipeline step
    Step {
        #[command(flatten)]
        options: StepOptions,

        /// Return the Detect exit code instead of failing the step
        #[arg(long)]
        return_status: bool,
    },

    /// Run Detect as a post-build action
    PostBuild {
        #[command(flatten)]
        options: StepOptions,
    },

    /// Load and validate the global configuration
    CheckConfig {
        /// Configuration file (discovered when not specified)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by both step commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StepOptions {
    /// Detect properties, e.g. "--detect.project.name=web-shop"
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub properties: String,

    /// Download strategy for this run
    #[arg(long, value_enum)]
    pub download_strategy: Option<StrategyArg>,

    /// Detect Air Gap installation to run (implies --download-strategy air-gap)
    #[arg(long)]
    pub air_gap_installation: Option<String>,

    /// Configuration file (discovered when not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Build workspace ($WORKSPACE or the current directory when not specified)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

impl StepOptions {
    /// Download strategy override requested on the command line
    pub fn download_override(&self) -> Result<Option<DownloadStrategy>> {
        let strategy = match (self.download_strategy, &self.air_gap_installation) {
            (None, None) => None,
            (None | Some(StrategyArg::AirGap), Some(name)) => Some(DownloadStrategy::AirGap {
                installation_name: name.clone(),
            }),
            (Some(StrategyArg::AirGap), None) => {
                anyhow::bail!("--download-strategy air-gap requires --air-gap-installation")
            }
            (Some(StrategyArg::Inherit), None) => Some(DownloadStrategy::InheritFromGlobal),
            (Some(StrategyArg::ScriptOrJar), None) => Some(DownloadStrategy::ScriptOrJar),
            (Some(other), Some(_)) => {
                anyhow::bail!(
                    "--air-gap-installation cannot be used with --download-strategy {other:?}"
                )
            }
        };
        Ok(strategy)
    }
}

/// Download strategies selectable on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Use the global configuration
    Inherit,
    /// Download the script, or run DETECT_JAR
    ScriptOrJar,
    /// Run a Detect Air Gap installation
    AirGap,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
///
/// Returns the build result the process exit code is derived from.
pub fn run() -> Result<BuildResult> {
    let args = Args::parse();

    let result = match args.command {
        Command::Step {
            options,
            return_status,
        } => step::run_pipeline_step(&options, return_status)?,
        Command::PostBuild { options } => step::run_post_build(&options)?,
        Command::CheckConfig { config } => {
            check_config::check_config(config.as_deref())?;
            BuildResult::Success
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
            BuildResult::Success
        }
    };

    Ok(result)
}
