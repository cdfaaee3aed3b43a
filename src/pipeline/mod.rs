//! Build step domain types and logic

pub mod download;
pub mod errors;
pub mod outcome;
pub mod steps;
pub mod types;

mod types_tests;

pub use download::DownloadStrategy;
pub use errors::{DetectError, ValidationError};
pub use outcome::{DetectExitCode, map_error, map_exit_code, map_outcome};
pub use steps::{DetectPipelineStep, DetectPostBuildStep};
pub use types::{BuildResult, Validate};
