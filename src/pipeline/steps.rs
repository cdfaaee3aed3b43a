//! Detect build steps
//!
//! Two entry points share the same runner:
//!
//! - [`DetectPostBuildStep`] for freestyle jobs, which only ever changes
//!   the build result
//! - [`DetectPipelineStep`] for pipelines (`synopsys_detect`), which can
//!   hand the exit code back to the script instead

use super::download::DownloadStrategy;
use super::errors::DetectError;
use super::outcome::{DetectExitCode, map_error, map_outcome};
use super::types::BuildResult;
use crate::executor::{BuildAgent, BuildContext, DetectRunner};
use serde::{Deserialize, Serialize};

/// Detect as a freestyle post-build action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectPostBuildStep {
    /// Free-text Detect properties
    pub detect_properties: String,

    /// Download strategy for this job; the global one when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_strategy_override: Option<DownloadStrategy>,
}

impl DetectPostBuildStep {
    /// Creates a post-build step
    #[must_use]
    pub fn new(detect_properties: impl Into<String>) -> Self {
        Self {
            detect_properties: detect_properties.into(),
            download_strategy_override: None,
        }
    }

    /// Overrides the download strategy
    #[must_use]
    pub fn with_download_strategy(mut self, strategy: DownloadStrategy) -> Self {
        self.download_strategy_override = Some(strategy);
        self
    }

    /// Runs Detect and records the result on the build
    ///
    /// Never fails: errors are logged and become the build result.
    pub fn perform<A: BuildAgent>(
        &self,
        runner: &DetectRunner<A>,
        build: &mut BuildContext,
    ) -> BuildResult {
        let outcome = runner.run_detect(
            build,
            &self.detect_properties,
            self.download_strategy_override.as_ref(),
        );

        match &outcome {
            Ok(0) => {}
            Ok(code) => {
                tracing::error!(exit_code = code, reason = %DetectExitCode(*code), "Detect failed");
            }
            Err(e) => log_error(e),
        }

        let result = map_outcome(&outcome);
        build.record_result(result);
        tracing::info!(
            step_result = %result,
            build_result = %build.result,
            "Detect post-build action finished"
        );
        result
    }
}

/// Detect as a pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectPipelineStep {
    /// Free-text Detect properties
    pub detect_properties: String,

    /// Return the exit code instead of failing the step
    pub return_status: bool,

    /// Download strategy for this step; the global one when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_strategy_override: Option<DownloadStrategy>,
}

impl DetectPipelineStep {
    /// Name the step is invoked by in a pipeline
    pub const STEP_NAME: &'static str = "synopsys_detect";

    /// Creates a pipeline step
    #[must_use]
    pub fn new(detect_properties: impl Into<String>) -> Self {
        Self {
            detect_properties: detect_properties.into(),
            ..Self::default()
        }
    }

    /// Sets whether the exit code is returned
    #[must_use]
    pub fn with_return_status(mut self, return_status: bool) -> Self {
        self.return_status = return_status;
        self
    }

    /// Overrides the download strategy
    #[must_use]
    pub fn with_download_strategy(mut self, strategy: DownloadStrategy) -> Self {
        self.download_strategy_override = Some(strategy);
        self
    }

    /// Runs Detect
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::DetectFailed`] for a non-zero exit code unless
    /// `return_status` is set, and any error raised while running Detect.
    pub fn run<A: BuildAgent>(
        &self,
        runner: &DetectRunner<A>,
        build: &BuildContext,
    ) -> Result<i32, DetectError> {
        let code = runner.run_detect(
            build,
            &self.detect_properties,
            self.download_strategy_override.as_ref(),
        )?;

        if self.return_status {
            tracing::info!(
                exit_code = code,
                reason = %DetectExitCode(code),
                "Returning Detect exit status"
            );
            return Ok(code);
        }
        if code != 0 {
            return Err(DetectError::DetectFailed { code });
        }
        Ok(code)
    }

    /// Build result for a finished run
    #[must_use]
    pub fn outcome(&self, result: &Result<i32, DetectError>) -> BuildResult {
        match result {
            Ok(_) if self.return_status => BuildResult::Success,
            Err(e) => {
                log_error(e);
                map_error(e)
            }
            ok => map_outcome(ok),
        }
    }
}

fn log_error(error: &DetectError) {
    if error.is_integration() {
        tracing::error!(error = %error, "Detect configuration error");
    } else if matches!(error, DetectError::Interrupted) {
        tracing::warn!("Detect run was aborted");
    } else {
        tracing::error!(error = %error, "Detect run failed");
    }
}
