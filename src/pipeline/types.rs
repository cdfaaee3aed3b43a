//! Core types for the build step domain
//!
//! This module contains the result states a build can end in once the
//! Detect step has run.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Possible outcomes of a build after the Detect step
///
/// Variants are ordered by severity, so `max` picks the worse result.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildResult {
    /// Build completed successfully
    #[default]
    Success,
    /// Build completed but something needs attention
    Unstable,
    /// Build failed
    Failure,
    /// Build was aborted before it could finish
    Aborted,
}

impl BuildResult {
    /// Returns true if result is successful
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if result is unstable
    #[must_use]
    pub fn is_unstable(&self) -> bool {
        matches!(self, Self::Unstable)
    }

    /// Returns true if result is a failure
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }

    /// Returns true if result is aborted
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Combines two results. A build result only ever gets worse.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }

    /// Process exit code used by the CLI for this result
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Unstable => 1,
            Self::Failure => 2,
            Self::Aborted => 3,
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Unstable => write!(f, "UNSTABLE"),
            Self::Failure => write!(f, "FAILURE"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
