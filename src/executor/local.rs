use super::process::{ConsoleLog, LaunchRequest, launch_process};
use super::traits::{AbortHandle, AgentCallable, BuildAgent};
use crate::pipeline::DetectError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Build agent that runs on the host system
#[derive(Debug, Clone)]
pub struct LocalAgent {
    /// Configuration for the agent
    config: AgentConfig,

    /// Console the launched processes write to
    console: ConsoleLog,
}

/// Configuration for the local agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Node name
    pub name: String,

    /// Agent root directory (default: `$HOME/.detect-runner`)
    pub root: PathBuf,

    /// POSIX shell available (default: the host platform)
    pub unix: bool,

    /// Node environment; the process environment when unset
    pub env: Option<HashMap<String, String>>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map_or_else(std::env::temp_dir, PathBuf::from);

        Self {
            name: "local".to_string(),
            root: home.join(".detect-runner"),
            unix: cfg!(unix),
            env: None,
        }
    }
}

impl LocalAgent {
    /// Creates a new local agent
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AgentConfig::default(),
            console: ConsoleLog::new(),
        }
    }

    /// Sets the agent root directory
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Overrides the detected platform
    #[must_use]
    pub fn with_unix(mut self, unix: bool) -> Self {
        self.config.unix = unix;
        self
    }

    /// Replaces the node environment
    #[must_use]
    pub fn with_environment(mut self, env: HashMap<String, String>) -> Self {
        self.config.env = Some(env);
        self
    }

    /// Adds a node environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let env = self
            .config
            .env
            .get_or_insert_with(|| std::env::vars().collect());
        env.insert(key.into(), value.into());
        self
    }

    /// Sets the console process output goes to
    #[must_use]
    pub fn with_console(mut self, console: ConsoleLog) -> Self {
        self.console = console;
        self
    }

    /// Console process output goes to
    #[must_use]
    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }
}

impl Default for LocalAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildAgent for LocalAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_unix(&self) -> bool {
        self.config.unix
    }

    fn root(&self) -> &Path {
        &self.config.root
    }

    fn environment(&self) -> HashMap<String, String> {
        self.config
            .env
            .clone()
            .unwrap_or_else(|| std::env::vars().collect())
    }

    fn call<C: AgentCallable>(&self, callable: C) -> Result<C::Output, DetectError> {
        tracing::debug!(agent = %self.config.name, "Running callable on agent");
        callable.call(&self.node_context())
    }

    fn launch(&self, request: &LaunchRequest, abort: &AbortHandle) -> Result<i32, DetectError> {
        launch_process(request, &self.console, abort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::NodeContext;

    struct RootProbe;

    impl AgentCallable for RootProbe {
        type Output = (PathBuf, Option<String>);

        fn call(self, node: &NodeContext) -> Result<Self::Output, DetectError> {
            Ok((node.tools_dir(), node.get_env("AGENT_LABEL").map(str::to_string)))
        }
    }

    #[test]
    fn test_local_agent_defaults() {
        let agent = LocalAgent::new();

        assert_eq!(agent.name(), "local");
        assert_eq!(agent.is_unix(), cfg!(unix));
        assert!(agent.root().ends_with(".detect-runner"));
    }

    #[test]
    fn test_call_sees_agent_context() {
        let agent = LocalAgent::new()
            .with_root("/agent")
            .with_environment(HashMap::from([(
                "AGENT_LABEL".to_string(),
                "linux".to_string(),
            )]));

        let (tools, label) = agent.call(RootProbe).unwrap();

        assert_eq!(tools, PathBuf::from("/agent/tools/Detect_Installation"));
        assert_eq!(label.as_deref(), Some("linux"));
    }

    #[test]
    fn test_with_env_extends_process_environment() {
        let agent = LocalAgent::new().with_env("AGENT_LABEL", "docker");
        let env = agent.environment();

        assert_eq!(env["AGENT_LABEL"], "docker");
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(env["PATH"], path);
        }
    }

    #[test]
    fn test_with_unix_override() {
        let agent = LocalAgent::new().with_unix(false);
        assert!(!agent.is_unix());
        assert!(!agent.node_context().is_unix);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_writes_to_agent_console() {
        let temp_dir = tempfile::tempdir().unwrap();
        let agent = LocalAgent::new().with_console(ConsoleLog::quiet());
        let request = LaunchRequest::new(
            vec!["/bin/sh".to_string(), "-c".to_string(), "echo detect".to_string()],
            HashMap::new(),
            temp_dir.path(),
        );

        let code = agent.launch(&request, &AbortHandle::new()).unwrap();

        assert_eq!(code, 0);
        assert_eq!(agent.console().lines(), vec!["detect".to_string()]);
    }
}
