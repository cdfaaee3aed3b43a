//! # detect-runner - Detect as a CI build step
//!
//! detect-runner runs the Detect software composition analysis tool as a
//! build step and maps its outcome onto a build result. The tool itself is
//! a separately distributed jar or bootstrap script; this crate decides how
//! to obtain it, assembles its environment and arguments, launches it on a
//! build agent and interprets the exit code.
//!
//! ## Features
//!
//! - **Execution strategies**: download the bootstrap script, run a Detect
//!   Air Gap jar, or run the jar named by `DETECT_JAR`
//! - **Argument handling**: tokenizing, `${VAR}` macro expansion and
//!   escaping for POSIX shells and PowerShell
//! - **Black Duck environment**: server URL, credentials and proxy settings
//!   forwarded as `BLACKDUCK_*` variables
//! - **Build results**: exit codes and errors mapped to
//!   SUCCESS, UNSTABLE, FAILURE or ABORTED
//!
//! ## Quick Start
//!
//! ```no_run
//! use detect_runner::{BuildContext, DetectPostBuildStep, DetectRunner, GlobalConfig, LocalAgent};
//!
//! let config = GlobalConfig::discover().expect("configuration");
//! let runner = DetectRunner::new(LocalAgent::new(), config);
//! let mut build = BuildContext::from_env();
//!
//! let step = DetectPostBuildStep::new("--detect.project.name=web-shop");
//! let result = step.perform(&runner, &mut build);
//! println!("Build result: {result}");
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 (<https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license (<https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    AbortHandle, AgentCallable, BuildAgent, BuildContext, ConsoleLog, DetectRunner,
    ExecutionStrategy, LaunchRequest, LocalAgent, NodeContext, ShellKind, build_arguments,
    mask_arguments, replace_macros, tokenize,
};
pub use infrastructure::{
    Credentials, GlobalConfig, ProxySettings, ScriptDownloader, ToolInstallation, init_logging,
};
pub use pipeline::{
    BuildResult, DetectError, DetectPipelineStep, DetectPostBuildStep, DownloadStrategy,
    Validate, ValidationError,
};

/// Version of the detect-runner crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
