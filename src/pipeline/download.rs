//! Download strategy configuration
//!
//! Decides where the Detect tool comes from: a downloaded script (or a
//! user-provided jar) or an air gap installation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the Detect tool is obtained for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadStrategy {
    /// Use whatever the global configuration says
    InheritFromGlobal,

    /// Download the Detect script, or run `DETECT_JAR` if it is set
    #[default]
    ScriptOrJar,

    /// Run the jar from a pre-provisioned tool installation
    AirGap {
        /// Name of the Detect Air Gap tool installation
        installation_name: String,
    },
}

impl DownloadStrategy {
    /// Resolves an override against the global strategy
    ///
    /// An explicit override wins. Inheriting from a global strategy that
    /// itself inherits falls back to [`DownloadStrategy::ScriptOrJar`].
    #[must_use]
    pub fn resolve(&self, global: &DownloadStrategy) -> DownloadStrategy {
        match (self, global) {
            (Self::InheritFromGlobal, Self::InheritFromGlobal) => Self::ScriptOrJar,
            (Self::InheritFromGlobal, global) => global.clone(),
            (explicit, _) => explicit.clone(),
        }
    }

    /// Resolves an optional override against the global strategy
    #[must_use]
    pub fn resolve_override(
        override_strategy: Option<&DownloadStrategy>,
        global: &DownloadStrategy,
    ) -> DownloadStrategy {
        override_strategy
            .unwrap_or(&DownloadStrategy::InheritFromGlobal)
            .resolve(global)
    }
}

impl fmt::Display for DownloadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InheritFromGlobal => write!(f, "Inherit from global configuration"),
            Self::ScriptOrJar => write!(f, "Script or DETECT_JAR"),
            Self::AirGap { installation_name } => {
                write!(f, "Air Gap installation '{installation_name}'")
            }
        }
    }
}
