//! Detect execution layer
//!
//! This module contains the build agent seam and everything needed to turn
//! a Detect step into a running process on an agent.

mod arguments;
mod environment;
mod java;
mod local;
mod process;
mod runner;
mod shell;
mod strategy;
mod traits;

pub use arguments::{PassthroughInfo, build_arguments, mask_arguments};
pub use environment::{
    BLACKDUCK_API_TOKEN, BLACKDUCK_PASSWORD, BLACKDUCK_PROXY_HOST, BLACKDUCK_PROXY_NTLM_DOMAIN,
    BLACKDUCK_PROXY_NTLM_WORKSTATION, BLACKDUCK_PROXY_PASSWORD, BLACKDUCK_PROXY_PORT,
    BLACKDUCK_PROXY_USERNAME, BLACKDUCK_TIMEOUT, BLACKDUCK_TRUST_CERT, BLACKDUCK_URL,
    BLACKDUCK_USERNAME, assemble_environment, proxy_credentials,
};
pub use java::{log_java_version, resolve_java};
pub use local::{AgentConfig, LocalAgent};
pub use process::{ConsoleLog, LaunchRequest, launch_process};
pub use runner::DetectRunner;
pub use shell::{ShellKind, replace_macros, tokenize};
pub use strategy::{
    AirGapJarStrategy, DETECT_JAR, DETECT_JAR_DOWNLOAD_DIR, ExecutionStrategy, ScriptStrategy,
    SetupCallable, UserJarStrategy, find_detect_jar, resolve_strategy,
};
pub use traits::{AbortHandle, AgentCallable, BuildAgent, BuildContext, NodeContext};
