//! Detect argument assembly

use super::shell::{ShellKind, replace_macros, tokenize};
use std::collections::HashMap;

const LOGGING_LEVEL_PROPERTY: &str = "logging.level.com.synopsys.integration";
const LOGGING_PROPERTIES: [&str; 2] = ["logging.level.detect", LOGGING_LEVEL_PROPERTY];
const PLUGIN_VERSION_PROPERTY: &str = "detect.phone.home.passthrough.jenkins.plugin.version";
const JENKINS_VERSION_PROPERTY: &str = "detect.phone.home.passthrough.jenkins.version";
const SENSITIVE_KEY_PARTS: [&str; 4] = ["password", "token", "api.key", "secret"];
const MASK: &str = "********";

/// Values passed through to Detect alongside the user's properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughInfo {
    /// Version of this runner
    pub plugin_version: String,

    /// Version of the CI server, when known
    pub jenkins_version: Option<String>,

    /// Detect logging level used unless the properties set one
    pub log_level: String,
}

impl PassthroughInfo {
    /// Passthrough values for a build environment
    #[must_use]
    pub fn from_env(env: &HashMap<String, String>, log_level: &str) -> Self {
        Self {
            plugin_version: crate::VERSION.to_string(),
            jenkins_version: env
                .get("JENKINS_VERSION")
                .filter(|v| !v.trim().is_empty())
                .cloned(),
            log_level: log_level.to_string(),
        }
    }
}

/// Builds the complete Detect command line
#[must_use]
pub fn build_arguments(
    invocation: &[String],
    properties: &str,
    env: &HashMap<String, String>,
    escaper: ShellKind,
    info: &PassthroughInfo,
) -> Vec<String> {
    let mut args: Vec<String> = invocation.to_vec();

    args.extend(
        tokenize(properties)
            .iter()
            .map(|token| replace_macros(token, env))
            .map(|token| escaper.escape(&token)),
    );

    if !LOGGING_PROPERTIES.iter().any(|p| properties.contains(p)) {
        args.push(as_argument(escaper, LOGGING_LEVEL_PROPERTY, &info.log_level));
    }
    args.push(as_argument(
        escaper,
        PLUGIN_VERSION_PROPERTY,
        &info.plugin_version,
    ));
    if let Some(version) = &info.jenkins_version {
        args.push(as_argument(escaper, JENKINS_VERSION_PROPERTY, version));
    }

    args
}

fn as_argument(escaper: ShellKind, key: &str, value: &str) -> String {
    escaper.escape(&format!("--{key}={value}"))
}

/// Hides secret values in `--key=value` arguments for logging
#[must_use]
pub fn mask_arguments(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, _)) if key.starts_with("--") && is_sensitive(key) => {
                format!("{key}={MASK}")
            }
            _ => arg.clone(),
        })
        .collect()
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEY_PARTS.iter().any(|part| key.contains(part))
}
