//! Execution strategies for Detect
//!
//! A strategy knows how to obtain the Detect tool on an agent and which
//! command prefix runs it:
//!
//! - [`ScriptStrategy`]: download the bootstrap script and run it with
//!   bash or PowerShell
//! - [`AirGapJarStrategy`]: run the jar of a Detect Air Gap installation
//! - [`UserJarStrategy`]: run the jar named by `DETECT_JAR`

use super::environment::proxy_credentials;
use super::java::{log_java_version, resolve_java};
use super::shell::ShellKind;
use super::traits::{AgentCallable, NodeContext};
use crate::infrastructure::{GlobalConfig, ScriptDownloader};
use crate::pipeline::{DetectError, DownloadStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a user-provided Detect jar
pub const DETECT_JAR: &str = "DETECT_JAR";

/// Environment variable telling the bootstrap script where to keep the jar
pub const DETECT_JAR_DOWNLOAD_DIR: &str = "DETECT_JAR_DOWNLOAD_DIR";

static DETECT_JAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(synopsys-)?detect-.*\.jar$").expect("valid jar pattern")
});

/// How Detect is obtained and started on an agent
#[allow(clippy::missing_errors_doc)]
pub trait ExecutionStrategy: Send + Sync + fmt::Debug {
    /// Name used in log messages
    fn name(&self) -> &'static str;

    /// Escaping applied to Detect arguments
    fn argument_escaper(&self) -> ShellKind;

    /// Adds strategy specific variables to the Detect environment
    fn prepare_environment(&self, _node: &NodeContext, _env: &mut HashMap<String, String>) {}

    /// Materializes the command prefix on the agent
    fn setup(&self, node: &NodeContext) -> Result<Vec<String>, DetectError>;
}

/// Ships a strategy's setup to the agent
///
/// The callable sees the assembled Detect environment instead of the bare
/// node environment, so `JAVA_HOME` from the build is honored.
#[derive(Debug)]
pub struct SetupCallable<'a> {
    strategy: &'a dyn ExecutionStrategy,
    env: HashMap<String, String>,
}

impl<'a> SetupCallable<'a> {
    /// Creates a setup callable
    #[must_use]
    pub fn new(strategy: &'a dyn ExecutionStrategy, env: HashMap<String, String>) -> Self {
        Self { strategy, env }
    }
}

impl AgentCallable for SetupCallable<'_> {
    type Output = Vec<String>;

    fn call(self, node: &NodeContext) -> Result<Self::Output, DetectError> {
        let node = NodeContext {
            env: self.env,
            ..node.clone()
        };
        self.strategy.setup(&node)
    }
}

/// Downloads the Detect bootstrap script and runs it through a shell
#[derive(Debug, Clone)]
pub struct ScriptStrategy {
    script_url: String,
    is_unix: bool,
    downloader: ScriptDownloader,
}

impl ScriptStrategy {
    /// Creates a script strategy for an agent shell
    #[must_use]
    pub fn new(script_url: impl Into<String>, is_unix: bool, downloader: ScriptDownloader) -> Self {
        Self {
            script_url: script_url.into(),
            is_unix,
            downloader,
        }
    }

    /// File name the script is stored under
    #[must_use]
    pub fn script_file_name(&self) -> String {
        url::Url::parse(&self.script_url)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                if self.is_unix {
                    "detect.sh".to_string()
                } else {
                    "detect.ps1".to_string()
                }
            })
    }

    fn invocation(&self, script: &Path) -> Vec<String> {
        let script = script.to_string_lossy();
        if self.is_unix {
            vec!["bash".to_string(), script.into_owned()]
        } else {
            vec![
                "powershell".to_string(),
                "-NoProfile".to_string(),
                "-ExecutionPolicy".to_string(),
                "Bypass".to_string(),
                "-Command".to_string(),
                format!("Import-Module '{}'; detect", script.replace('\'', "''")),
            ]
        }
    }
}

impl ExecutionStrategy for ScriptStrategy {
    fn name(&self) -> &'static str {
        "script"
    }

    fn argument_escaper(&self) -> ShellKind {
        ShellKind::for_agent(self.is_unix)
    }

    fn prepare_environment(&self, node: &NodeContext, env: &mut HashMap<String, String>) {
        env.entry(DETECT_JAR_DOWNLOAD_DIR.to_string())
            .or_insert_with(|| node.tools_dir().to_string_lossy().into_owned());
    }

    fn setup(&self, node: &NodeContext) -> Result<Vec<String>, DetectError> {
        let dir = node.tools_dir();
        std::fs::create_dir_all(&dir)?;

        let script = dir.join(self.script_file_name());
        let cached = std::fs::metadata(&script).is_ok_and(|m| m.len() > 0);
        if cached {
            tracing::debug!(
                script = %script.display(),
                "Using previously downloaded Detect script"
            );
        } else {
            self.downloader.download(&self.script_url, &script)?;
        }

        #[cfg(unix)]
        if self.is_unix {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
        }

        tracing::info!(script = %script.display(), "Running Detect script");
        Ok(self.invocation(&script))
    }
}

/// Runs the jar of a Detect Air Gap tool installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirGapJarStrategy {
    installation_name: String,
    home: PathBuf,
    jdk_home: Option<PathBuf>,
}

impl AirGapJarStrategy {
    /// Creates an air gap strategy
    #[must_use]
    pub fn new(
        installation_name: impl Into<String>,
        home: impl Into<PathBuf>,
        jdk_home: Option<PathBuf>,
    ) -> Self {
        Self {
            installation_name: installation_name.into(),
            home: home.into(),
            jdk_home,
        }
    }
}

impl ExecutionStrategy for AirGapJarStrategy {
    fn name(&self) -> &'static str {
        "air gap jar"
    }

    fn argument_escaper(&self) -> ShellKind {
        ShellKind::None
    }

    fn setup(&self, node: &NodeContext) -> Result<Vec<String>, DetectError> {
        let jar = find_detect_jar(&self.home)?;
        tracing::info!(
            installation = %self.installation_name,
            jar = %jar.display(),
            "Running Detect Air Gap jar"
        );

        let java = resolve_java(node, self.jdk_home.as_deref());
        log_java_version(&java, &node.env);

        Ok(java_invocation(&java, &jar))
    }
}

/// Runs the jar named by `DETECT_JAR`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserJarStrategy {
    jar: PathBuf,
    jdk_home: Option<PathBuf>,
}

impl UserJarStrategy {
    /// Creates a strategy for a user-provided jar
    #[must_use]
    pub fn new(jar: impl Into<PathBuf>, jdk_home: Option<PathBuf>) -> Self {
        Self {
            jar: jar.into(),
            jdk_home,
        }
    }
}

impl ExecutionStrategy for UserJarStrategy {
    fn name(&self) -> &'static str {
        "user jar"
    }

    fn argument_escaper(&self) -> ShellKind {
        ShellKind::None
    }

    fn setup(&self, node: &NodeContext) -> Result<Vec<String>, DetectError> {
        if !self.jar.is_file() {
            tracing::warn!(
                jar = %self.jar.display(),
                "DETECT_JAR does not point to a file on this agent"
            );
        }
        tracing::info!(jar = %self.jar.display(), "Running Detect jar from DETECT_JAR");

        let java = resolve_java(node, self.jdk_home.as_deref());
        log_java_version(&java, &node.env);

        Ok(java_invocation(&java, &self.jar))
    }
}

fn java_invocation(java: &Path, jar: &Path) -> Vec<String> {
    vec![
        java.to_string_lossy().into_owned(),
        "-jar".to_string(),
        jar.to_string_lossy().into_owned(),
    ]
}

/// Finds the single Detect jar in an air gap installation
///
/// # Errors
///
/// Returns [`DetectError::AirGapJarNotFound`] if the directory is missing or
/// has no Detect jar, and [`DetectError::MultipleAirGapJars`] if it has
/// more than one.
pub fn find_detect_jar(home: &Path) -> Result<PathBuf, DetectError> {
    let not_found = || DetectError::AirGapJarNotFound {
        home: home.to_path_buf(),
    };

    let mut jars: Vec<PathBuf> = std::fs::read_dir(home)
        .map_err(|_| not_found())?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| DETECT_JAR_PATTERN.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();

    match jars.len() {
        0 => Err(not_found()),
        1 => Ok(jars.remove(0)),
        count => Err(DetectError::MultipleAirGapJars {
            home: home.to_path_buf(),
            count,
        }),
    }
}

/// Picks the execution strategy for a run
///
/// # Errors
///
/// Returns [`DetectError::AirGapInstallationNotFound`] for an unknown air
/// gap installation and [`DetectError::MissingCredentials`] if the proxy
/// credentials cannot be found.
pub fn resolve_strategy(
    download_strategy: &DownloadStrategy,
    env: &HashMap<String, String>,
    is_unix: bool,
    config: &GlobalConfig,
) -> Result<Box<dyn ExecutionStrategy>, DetectError> {
    let jdk_home = config.jdk_home.clone();

    if let DownloadStrategy::AirGap { installation_name } = download_strategy {
        let installation = config.air_gap_installation(installation_name).ok_or_else(|| {
            DetectError::AirGapInstallationNotFound {
                name: installation_name.clone(),
            }
        })?;
        return Ok(Box::new(AirGapJarStrategy::new(
            installation_name.clone(),
            installation.home.clone(),
            jdk_home,
        )));
    }

    if let Some(jar) = env.get(DETECT_JAR).filter(|jar| !jar.trim().is_empty()) {
        return Ok(Box::new(UserJarStrategy::new(jar.trim(), jdk_home)));
    }

    let downloader = ScriptDownloader::new()
        .with_proxy(config.proxy.clone(), proxy_credentials(config)?)
        .with_timeout(Duration::from_secs(config.blackduck.timeout));

    Ok(Box::new(ScriptStrategy::new(
        config.script_urls.for_agent(is_unix),
        is_unix,
        downloader,
    )))
}
