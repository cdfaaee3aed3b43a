//! Build agent traits
//!
//! A build agent is the (possibly remote) machine that executes the
//! build. Work is shipped to it as [`AgentCallable`] values and the final
//! Detect process is launched on it through [`BuildAgent::launch`].

use super::process::LaunchRequest;
use crate::pipeline::{BuildResult, DetectError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A machine that runs build steps
#[allow(clippy::missing_errors_doc)]
pub trait BuildAgent: Send + Sync {
    /// Name of the agent node
    fn name(&self) -> &str;

    /// Returns true if the agent runs a POSIX shell, false for Windows
    fn is_unix(&self) -> bool;

    /// Root directory of the agent's filesystem area
    fn root(&self) -> &Path;

    /// Node-level environment variables
    fn environment(&self) -> HashMap<String, String>;

    /// Runs a computation on the agent
    fn call<C: AgentCallable>(&self, callable: C) -> Result<C::Output, DetectError>
    where
        Self: Sized;

    /// Launches a process on the agent and waits for its exit code
    fn launch(&self, request: &LaunchRequest, abort: &AbortHandle) -> Result<i32, DetectError>;

    /// Snapshot of the agent handed to callables
    fn node_context(&self) -> NodeContext {
        NodeContext {
            name: self.name().to_string(),
            root: self.root().to_path_buf(),
            is_unix: self.is_unix(),
            env: self.environment(),
        }
    }
}

/// A computation that runs on a build agent
#[allow(clippy::missing_errors_doc)]
pub trait AgentCallable: Send {
    /// Value sent back to the caller
    type Output: Send;

    /// Executes on the agent
    fn call(self, node: &NodeContext) -> Result<Self::Output, DetectError>;
}

/// What a callable can see of the agent it runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContext {
    /// Agent name
    pub name: String,

    /// Agent root directory
    pub root: PathBuf,

    /// POSIX shell available
    pub is_unix: bool,

    /// Node-level environment variables
    pub env: HashMap<String, String>,
}

impl NodeContext {
    /// Directory where Detect tools are cached on the agent
    #[must_use]
    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools").join("Detect_Installation")
    }

    /// Gets a non-blank environment variable
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Context of the build the Detect step runs in
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Workspace directory
    pub workspace: PathBuf,

    /// Name of the job
    pub job_name: String,

    /// Build number
    pub build_number: u64,

    /// Build environment variables
    pub env: HashMap<String, String>,

    /// Result of the build so far
    pub result: BuildResult,
}

impl BuildContext {
    /// Creates a build context with the Jenkins build variables set
    #[must_use]
    pub fn new(workspace: impl Into<PathBuf>, job_name: &str, build_number: u64) -> Self {
        let workspace = workspace.into();
        let env = HashMap::from([
            (
                "WORKSPACE".to_string(),
                workspace.to_string_lossy().to_string(),
            ),
            ("JOB_NAME".to_string(), job_name.to_string()),
            ("BUILD_NUMBER".to_string(), build_number.to_string()),
            ("BUILD_ID".to_string(), uuid::Uuid::new_v4().to_string()),
        ]);

        Self {
            workspace,
            job_name: job_name.to_string(),
            build_number,
            env,
            result: BuildResult::Success,
        }
    }

    /// Creates a build context from the process environment
    ///
    /// Reads `WORKSPACE`, `JOB_NAME` and `BUILD_NUMBER` as Jenkins exports
    /// them, defaulting to the current directory, `detect` and `1`.
    #[must_use]
    pub fn from_env() -> Self {
        let workspace = std::env::var("WORKSPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default());
        let job_name = std::env::var("JOB_NAME").unwrap_or_else(|_| "detect".to_string());
        let build_number = std::env::var("BUILD_NUMBER")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);

        let mut context = Self::new(workspace, &job_name, build_number);
        if let Ok(build_id) = std::env::var("BUILD_ID") {
            context.set_env("BUILD_ID", build_id);
        }
        context
    }

    /// Sets a build environment variable
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Gets a build environment variable
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&String> {
        self.env.get(key)
    }

    /// Records a step result; the build result only ever gets worse
    pub fn record_result(&mut self, result: BuildResult) {
        self.result = self.result.combine(result);
    }
}

/// Cancellation flag shared between the runner and whoever may abort it
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Creates a handle that has not been tripped
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the running build be aborted
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once an abort was requested
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
