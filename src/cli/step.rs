//! `detect-runner step` and `detect-runner post-build`
//!
//! Runs Detect on the local agent for the build described by the Jenkins
//! environment variables (`WORKSPACE`, `JOB_NAME`, `BUILD_NUMBER`).
//!
//! ## Usage
//!
//! ```bash
//! detect-runner step --properties "--detect.project.name=web-shop" --return-status
//! detect-runner post-build --air-gap-installation detect-10
//! # Exit code 0: SUCCESS, 1: UNSTABLE, 2: FAILURE, 3: ABORTED
//! ```

use super::StepOptions;
use anyhow::{Context, Result};
use detect_runner::{
    AbortHandle, BuildContext, BuildResult, DetectError, DetectPipelineStep, DetectPostBuildStep,
    DetectRunner, GlobalConfig, LocalAgent, Validate, init_logging,
};
use std::path::Path;

/// Runs Detect with pipeline step semantics
pub fn run_pipeline_step(options: &StepOptions, return_status: bool) -> Result<BuildResult> {
    let (runner, build) = prepare(options)?;

    let mut step = DetectPipelineStep::new(&options.properties).with_return_status(return_status);
    step.download_strategy_override = options.download_override()?;

    let result = step.run(&runner, &build);
    match &result {
        Ok(code) => println!("exit status: {code}"),
        Err(e) => eprintln!("Error: {e}"),
    }

    Ok(step.outcome(&result))
}

/// Runs Detect with post-build action semantics
pub fn run_post_build(options: &StepOptions) -> Result<BuildResult> {
    let (runner, mut build) = prepare(options)?;

    let mut step = DetectPostBuildStep::new(&options.properties);
    step.download_strategy_override = options.download_override()?;

    step.perform(&runner, &mut build);
    println!("Build result: {}", build.result);

    Ok(build.result)
}

/// Loads and validates the global configuration
pub fn load_config(path: Option<&Path>) -> Result<GlobalConfig> {
    let config = match path {
        Some(path) => GlobalConfig::load(path)?,
        None => GlobalConfig::discover()?,
    };
    config
        .validate()
        .map_err(DetectError::from)
        .context("Invalid configuration")?;
    Ok(config)
}

fn prepare(options: &StepOptions) -> Result<(DetectRunner<LocalAgent>, BuildContext)> {
    let config = load_config(options.config.as_deref())?;
    init_logging(&config.log_level);

    let mut build = BuildContext::from_env();
    if let Some(workspace) = &options.workspace {
        build.workspace.clone_from(workspace);
        build.set_env("WORKSPACE", workspace.to_string_lossy());
    }
    if !build.workspace.is_dir() {
        anyhow::bail!("Workspace not found: {}", build.workspace.display());
    }

    let abort = AbortHandle::new();
    install_abort_handler(abort.clone());

    let runner = DetectRunner::new(LocalAgent::new(), config).with_abort_handle(abort);
    Ok((runner, build))
}

/// Trips `abort` on Ctrl-C
fn install_abort_handler(abort: AbortHandle) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!(error = %e, "Could not install Ctrl-C handler");
                return;
            }
        };

        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received, aborting Detect");
                abort.abort();
            }
        });
    });
}
