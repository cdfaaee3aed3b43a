//! Detect orchestration
//!
//! [`DetectRunner`] strings the pieces together for one run: pick the
//! download strategy, assemble the environment, materialize the command
//! prefix on the agent, build the arguments and launch Detect in the
//! build workspace.

use super::arguments::{PassthroughInfo, build_arguments, mask_arguments};
use super::environment::assemble_environment;
use super::process::LaunchRequest;
use super::strategy::{SetupCallable, resolve_strategy};
use super::traits::{AbortHandle, BuildAgent, BuildContext};
use crate::infrastructure::{GlobalConfig, detect_log_level};
use crate::pipeline::{DetectError, DetectExitCode, DownloadStrategy};
use std::time::Instant;

/// Runs Detect on a build agent
#[derive(Debug)]
pub struct DetectRunner<A: BuildAgent> {
    agent: A,
    config: GlobalConfig,
    abort: AbortHandle,
}

impl<A: BuildAgent> DetectRunner<A> {
    /// Creates a runner for an agent
    #[must_use]
    pub fn new(agent: A, config: GlobalConfig) -> Self {
        Self {
            agent,
            config,
            abort: AbortHandle::new(),
        }
    }

    /// Shares an existing abort handle with the runner
    #[must_use]
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    /// Handle that aborts a running Detect
    #[must_use]
    pub fn abort_handle(&self) -> &AbortHandle {
        &self.abort
    }

    /// Agent Detect runs on
    #[must_use]
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Global configuration
    #[must_use]
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Runs Detect once and returns its exit code
    ///
    /// A non-zero exit code is not an error here; the steps decide what
    /// it means for the build.
    ///
    /// # Errors
    ///
    /// Returns integration errors for configuration and setup problems,
    /// [`DetectError::Launch`] if Detect cannot be started and
    /// [`DetectError::Interrupted`] if the run is aborted.
    pub fn run_detect(
        &self,
        build: &BuildContext,
        properties: &str,
        download_override: Option<&DownloadStrategy>,
    ) -> Result<i32, DetectError> {
        if self.abort.is_aborted() {
            return Err(DetectError::Interrupted);
        }
        let start = Instant::now();

        let download_strategy =
            DownloadStrategy::resolve_override(download_override, &self.config.download_strategy);
        let node = self.agent.node_context();
        tracing::info!(
            job = %build.job_name,
            build = build.build_number,
            agent = %node.name,
            strategy = %download_strategy,
            "Running Detect"
        );

        let mut env = assemble_environment(&node.env, &build.env, &self.config)?;
        let strategy = resolve_strategy(&download_strategy, &env, node.is_unix, &self.config)?;
        strategy.prepare_environment(&node, &mut env);
        tracing::debug!(
            strategy = strategy.name(),
            vars = env.len(),
            "Execution strategy selected"
        );

        let invocation = self
            .agent
            .call(SetupCallable::new(strategy.as_ref(), env.clone()))?;

        let info = PassthroughInfo::from_env(&env, detect_log_level(&self.config.log_level));
        let args = build_arguments(
            &invocation,
            properties,
            &env,
            strategy.argument_escaper(),
            &info,
        );
        tracing::info!(command = %mask_arguments(&args).join(" "), "Detect command");

        let request = LaunchRequest::new(args, env, &build.workspace);
        let code = self.agent.launch(&request, &self.abort)?;

        let exit = DetectExitCode(code);
        if code == 0 {
            tracing::info!(
                exit_code = code,
                duration_ms = start.elapsed().as_millis(),
                "Detect finished"
            );
        } else {
            tracing::warn!(
                exit_code = code,
                reason = %exit,
                duration_ms = start.elapsed().as_millis(),
                "Detect finished with a failure"
            );
        }

        Ok(code)
    }
}
