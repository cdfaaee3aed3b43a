//! Prelude module for common imports

// Re-export step and result types
pub use crate::pipeline::download::DownloadStrategy;
pub use crate::pipeline::errors::{DetectError, ValidationError};
pub use crate::pipeline::outcome::{DetectExitCode, map_outcome};
pub use crate::pipeline::steps::{DetectPipelineStep, DetectPostBuildStep};
pub use crate::pipeline::types::{BuildResult, Validate};

// Re-export executor types
pub use crate::executor::{
    AbortHandle, AgentCallable, BuildAgent, BuildContext, DetectRunner, ExecutionStrategy,
    LocalAgent, NodeContext,
};

// Re-export configuration
pub use crate::infrastructure::{GlobalConfig, init_logging};
