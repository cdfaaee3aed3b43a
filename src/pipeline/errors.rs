//! Error types for the build step domain

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running Detect
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// Configuration or setup problem that keeps Detect from starting
    #[error("{0}")]
    Integration(String),

    /// The named air gap installation is not configured
    #[error("Detect Air Gap tool installation '{name}' could not be found")]
    AirGapInstallationNotFound {
        /// Name of the missing installation.
        name: String,
    },

    /// The air gap installation directory holds no Detect jar
    #[error(
        "Expected 1 jar from Detect Air Gap tool installation at {} and did not find any. Check your tool configuration.",
        home.display()
    )]
    AirGapJarNotFound {
        /// Installation home that was searched.
        home: PathBuf,
    },

    /// The air gap installation directory holds more than one Detect jar
    #[error(
        "Expected 1 jar from Detect Air Gap tool installation at {} and found {count}. Check your tool configuration.",
        home.display()
    )]
    MultipleAirGapJars {
        /// Installation home that was searched.
        home: PathBuf,
        /// Number of candidate jars found.
        count: usize,
    },

    /// Downloading the Detect script failed
    #[error("Could not download {url}: {reason}")]
    Download {
        /// URL that was requested.
        url: String,
        /// Why the download failed.
        reason: String,
    },

    /// A credentials id is referenced but not present in the store
    #[error("No credentials could be found with id '{id}'")]
    MissingCredentials {
        /// The credentials id.
        id: String,
    },

    /// The command to launch was empty
    #[error("Cannot launch an empty command")]
    EmptyCommand,

    /// The subprocess could not be started
    #[error("Could not launch '{program}': {reason}")]
    Launch {
        /// Program that was launched.
        program: String,
        /// Underlying failure.
        reason: String,
    },

    /// Detect ran and returned a non-zero exit code
    #[error("Detect failed with exit code {code}")]
    DetectFailed {
        /// Exit code returned by Detect.
        code: i32,
    },

    /// The run was cancelled
    #[error("Detect thread was interrupted")]
    Interrupted,

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration is invalid
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl DetectError {
    /// Returns true for configuration and setup problems.
    ///
    /// These leave the build unstable rather than failed.
    #[must_use]
    pub fn is_integration(&self) -> bool {
        matches!(
            self,
            Self::Integration(_)
                | Self::AirGapInstallationNotFound { .. }
                | Self::AirGapJarNotFound { .. }
                | Self::MultipleAirGapJars { .. }
                | Self::Download { .. }
                | Self::MissingCredentials { .. }
                | Self::Config(_)
                | Self::Validation(_)
        )
    }
}

impl From<std::io::Error> for DetectError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Validation errors for the global configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A URL does not parse
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Invalid timeout value
    #[error("Invalid timeout: must be positive, got {value}")]
    InvalidTimeout {
        /// The invalid timeout value.
        value: u64,
    },

    /// Two tool installations share a name
    #[error("Duplicate Detect Air Gap installation name: '{0}'")]
    DuplicateInstallation(String),

    /// A tool installation has no home directory
    #[error("Detect Air Gap installation '{0}' has an empty home directory")]
    EmptyInstallationHome(String),

    /// The default download strategy names an unknown installation
    #[error("Unknown Detect Air Gap installation: '{0}'")]
    UnknownInstallation(String),

    /// A credentials id is not present in the store
    #[error("Unknown credentials id: '{0}'")]
    UnknownCredentials(String),

    /// Proxy port must be non-zero
    #[error("Invalid proxy port: {0}")]
    InvalidProxyPort(u16),
}
