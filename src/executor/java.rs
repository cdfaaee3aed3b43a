//! Java resolution for jar based strategies

use super::traits::NodeContext;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Finds the java executable to run Detect with
///
/// Prefers the JDK configured for the node, then `JAVA_HOME`, then
/// whatever `java` is on the `PATH`.
#[must_use]
pub fn resolve_java(node: &NodeContext, jdk_home: Option<&Path>) -> PathBuf {
    let executable = if node.is_unix { "java" } else { "java.exe" };

    let home = jdk_home
        .filter(|home| !home.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| node.get_env("JAVA_HOME").map(PathBuf::from));

    match home {
        Some(home) => home.join("bin").join(executable),
        None => PathBuf::from(executable),
    }
}

/// Logs the version of the java executable
///
/// Returns the first line `java -version` printed, if any. Problems are
/// only warnings: Detect itself reports a broken java.
pub fn log_java_version(java: &Path, env: &HashMap<String, String>) -> Option<String> {
    tracing::info!(java = %java.display(), "Running with JAVA");

    let output = match Command::new(java).arg("-version").env_clear().envs(env).output() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(
                java = %java.display(),
                error = %e,
                "Could not determine java version"
            );
            return None;
        }
    };

    // java -version writes to stderr
    let text = if output.stderr.is_empty() {
        output.stdout
    } else {
        output.stderr
    };
    let version = String::from_utf8_lossy(&text)
        .lines()
        .next()
        .map(|line| line.trim().to_string());

    match &version {
        Some(version) => tracing::info!(version = %version, "Detected java version"),
        None => tracing::warn!(java = %java.display(), "java -version printed nothing"),
    }
    version
}
