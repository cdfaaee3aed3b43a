//! Infrastructure layer
//!
//! This module contains configuration, logging and the HTTP download.

mod config;
mod download;
mod logging;

pub use config::{
    BlackDuckSettings, CONFIG_ENV_VAR, Credentials, DEFAULT_CONFIG_FILE, DEFAULT_UNIX_SCRIPT_URL,
    DEFAULT_WINDOWS_SCRIPT_URL, GlobalConfig, ProxySettings, ScriptUrls, ToolInstallation,
};
pub use download::ScriptDownloader;
pub use logging::{detect_log_level, init_logging};
