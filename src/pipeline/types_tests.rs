//! Tests for build step types
//!
//! This module contains tests for the result and strategy types

#[cfg(test)]
mod types_tests {
    use super::super::*;
    use serde_json;

    #[test]
    fn test_build_result_predicates() {
        assert!(BuildResult::Success.is_success());
        assert!(!BuildResult::Failure.is_success());

        assert!(BuildResult::Unstable.is_unstable());
        assert!(!BuildResult::Success.is_unstable());

        assert!(BuildResult::Failure.is_failure());
        assert!(!BuildResult::Aborted.is_failure());

        assert!(BuildResult::Aborted.is_aborted());
        assert!(!BuildResult::Unstable.is_aborted());
    }

    #[test]
    fn test_build_result_display() {
        assert_eq!(BuildResult::Success.to_string(), "SUCCESS");
        assert_eq!(BuildResult::Unstable.to_string(), "UNSTABLE");
        assert_eq!(BuildResult::Failure.to_string(), "FAILURE");
        assert_eq!(BuildResult::Aborted.to_string(), "ABORTED");
    }

    #[test]
    fn test_build_result_only_gets_worse() {
        assert_eq!(
            BuildResult::Success.combine(BuildResult::Unstable),
            BuildResult::Unstable
        );
        assert_eq!(
            BuildResult::Failure.combine(BuildResult::Unstable),
            BuildResult::Failure
        );
        assert_eq!(
            BuildResult::Failure.combine(BuildResult::Aborted),
            BuildResult::Aborted
        );
        assert_eq!(
            BuildResult::Success.combine(BuildResult::Success),
            BuildResult::Success
        );
    }

    #[test]
    fn test_build_result_exit_codes() {
        assert_eq!(BuildResult::Success.exit_code(), 0);
        assert_eq!(BuildResult::Unstable.exit_code(), 1);
        assert_eq!(BuildResult::Failure.exit_code(), 2);
        assert_eq!(BuildResult::Aborted.exit_code(), 3);
    }

    #[test]
    fn test_build_result_serialize() {
        let json = serde_json::to_string(&BuildResult::Unstable).unwrap();
        assert_eq!(json, r#""unstable""#);
    }

    #[test]
    fn test_build_result_deserialize() {
        let result: BuildResult = serde_json::from_str(r#""aborted""#).unwrap();
        assert_eq!(result, BuildResult::Aborted);
    }

    #[test]
    fn test_build_result_default() {
        assert_eq!(BuildResult::default(), BuildResult::Success);
    }

    #[test]
    fn test_download_strategy_serialize() {
        let strategy = DownloadStrategy::AirGap {
            installation_name: "detect".to_string(),
        };
        let json = serde_json::to_string(&strategy).unwrap();
        assert_eq!(json, r#"{"type":"air_gap","installation_name":"detect"}"#);
    }
}
