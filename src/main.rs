//! detect-runner - run Detect as a CI build step
//!
//! Runs the Detect software composition analysis tool for the build
//! described by the Jenkins environment and exits with a code derived
//! from the build result.
//!
//! ## Commands
//!
//! - `detect-runner step` - Run Detect as a pipeline step
//! - `detect-runner post-build` - Run Detect as a post-build action
//! - `detect-runner check-config` - Validate the global configuration
//! - `detect-runner completions` - Generate shell completions
//!
//! ## Exit codes
//!
//! | Code | Build result |
//! |------|--------------|
//! | 0 | SUCCESS |
//! | 1 | UNSTABLE, or the command could not run |
//! | 2 | FAILURE |
//! | 3 | ABORTED |
//!
//! ## Quick Start
//!
//! ```bash
//! # Check the global configuration
//! detect-runner check-config --config .detect-runner.yaml
//!
//! # Scan the workspace, failing the step on a non-zero Detect exit code
//! detect-runner step --properties "--detect.project.name=web-shop"
//!
//! # Generate shell completions
//! detect-runner completions bash > /etc/bash_completion.d/detect-runner
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(result) => ExitCode::from(result.exit_code()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("DETECT_RUNNER_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
