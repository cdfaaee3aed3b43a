//! Maps Detect exit codes and errors onto build results

use super::errors::DetectError;
use super::types::BuildResult;
use std::fmt;

/// Well-known Detect exit codes, used to describe a failure in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectExitCode(pub i32);

impl DetectExitCode {
    /// Name of the exit code as Detect reports it
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "SUCCESS",
            1 => "FAILURE_BLACKDUCK_CONNECTIVITY",
            2 => "FAILURE_TIMEOUT",
            3 => "FAILURE_POLICY_VIOLATION",
            4 => "FAILURE_PROXY_CONNECTIVITY",
            5 => "FAILURE_DETECTOR",
            6 => "FAILURE_SCAN",
            7 => "FAILURE_CONFIGURATION",
            8 => "FAILURE_DETECTOR_REQUIRED",
            9 => "FAILURE_DOCKER",
            10 => "FAILURE_BLACKDUCK_VERSION_NOT_SUPPORTED",
            11 => "FAILURE_BLACKDUCK_FEATURE_ERROR",
            12 => "FAILURE_POLARIS_CONNECTIVITY",
            13 => "FAILURE_MINIMUM_INTERVAL_NOT_MET",
            14 => "FAILURE_IAC",
            15 => "FAILURE_ACCURACY_NOT_MET",
            20 => "FAILURE_IMAGE_NOT_AVAILABLE",
            99 => "FAILURE_GENERAL_ERROR",
            100 => "FAILURE_UNKNOWN_ERROR",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for DetectExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "UNKNOWN({})", self.0),
        }
    }
}

/// Maps a Detect exit code onto a build result
#[must_use]
pub fn map_exit_code(code: i32) -> BuildResult {
    if code == 0 {
        BuildResult::Success
    } else {
        BuildResult::Failure
    }
}

/// Maps an error raised while running Detect onto a build result
#[must_use]
pub fn map_error(error: &DetectError) -> BuildResult {
    match error {
        DetectError::Interrupted => BuildResult::Aborted,
        e if e.is_integration() => BuildResult::Unstable,
        _ => BuildResult::Failure,
    }
}

/// Maps the outcome of a Detect run onto a build result
#[must_use]
pub fn map_outcome(outcome: &Result<i32, DetectError>) -> BuildResult {
    match outcome {
        Ok(code) => map_exit_code(*code),
        Err(e) => map_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(map_exit_code(0), BuildResult::Success);
        assert_eq!(map_exit_code(3), BuildResult::Failure);
        assert_eq!(map_exit_code(-1), BuildResult::Failure);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(map_error(&DetectError::Interrupted), BuildResult::Aborted);
        assert_eq!(
            map_error(&DetectError::AirGapJarNotFound {
                home: "/opt".into()
            }),
            BuildResult::Unstable
        );
        assert_eq!(
            map_error(&DetectError::DetectFailed { code: 3 }),
            BuildResult::Failure
        );
        assert_eq!(map_error(&DetectError::EmptyCommand), BuildResult::Failure);
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(map_outcome(&Ok(0)), BuildResult::Success);
        assert_eq!(map_outcome(&Ok(7)), BuildResult::Failure);
        assert_eq!(
            map_outcome(&Err(DetectError::Integration("no jar".into()))),
            BuildResult::Unstable
        );
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(DetectExitCode(3).to_string(), "FAILURE_POLICY_VIOLATION");
        assert_eq!(DetectExitCode(100).to_string(), "FAILURE_UNKNOWN_ERROR");
        assert_eq!(DetectExitCode(42).to_string(), "UNKNOWN(42)");
    }
}
