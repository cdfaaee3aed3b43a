//! Configuration management
//!
//! The global configuration mirrors what a Jenkins administrator sets up
//! once for every job: the Black Duck server, credentials, proxy, the
//! default download strategy and the Detect Air Gap tool installations.

use crate::pipeline::{DetectError, DownloadStrategy, Validate, ValidationError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default location of the Detect bootstrap script for unix agents
pub const DEFAULT_UNIX_SCRIPT_URL: &str = "https://detect.blackduck.com/detect10.sh";

/// Default location of the Detect bootstrap script for Windows agents
pub const DEFAULT_WINDOWS_SCRIPT_URL: &str = "https://detect.blackduck.com/detect10.ps1";

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "DETECT_RUNNER_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".detect-runner.yaml";

/// Global configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Black Duck server connection
    pub blackduck: BlackDuckSettings,

    /// Strategy used when a step does not override it
    pub download_strategy: DownloadStrategy,

    /// Where the bootstrap scripts are downloaded from
    pub script_urls: ScriptUrls,

    /// Proxy used for Black Duck and script downloads
    pub proxy: Option<ProxySettings>,

    /// Credentials store
    pub credentials: Vec<Credentials>,

    /// Detect Air Gap tool installations
    pub air_gap_installations: Vec<ToolInstallation>,

    /// JDK configured for the build node
    pub jdk_home: Option<PathBuf>,

    /// Log level
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            blackduck: BlackDuckSettings::default(),
            download_strategy: DownloadStrategy::ScriptOrJar,
            script_urls: ScriptUrls::default(),
            proxy: None,
            credentials: Vec::new(),
            air_gap_installations: Vec::new(),
            jdk_home: None,
            log_level: "info".to_string(),
        }
    }
}

impl GlobalConfig {
    /// Parses configuration from YAML
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Config`] if the document does not parse
    pub fn from_yaml(yaml: &str) -> Result<Self, DetectError> {
        serde_yaml::from_str(yaml).map_err(|e| DetectError::Config(e.to_string()))
    }

    /// Loads configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Config`] if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, DetectError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DetectError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Self::from_yaml(&content)
    }

    /// Finds the configuration to use
    ///
    /// Looks at `$DETECT_RUNNER_CONFIG`, then `./.detect-runner.yaml`, and
    /// falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Config`] if a discovered file is unreadable
    pub fn discover() -> Result<Self, DetectError> {
        Self::discover_from(std::env::var(CONFIG_ENV_VAR).ok(), Path::new("."))
    }

    fn discover_from(explicit: Option<String>, dir: &Path) -> Result<Self, DetectError> {
        if let Some(path) = explicit
            && !path.trim().is_empty()
        {
            return Self::load(Path::new(&path));
        }

        let local = dir.join(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(&local);
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Looks up credentials by id
    #[must_use]
    pub fn credentials(&self, id: &str) -> Option<&Credentials> {
        self.credentials.iter().find(|c| c.id() == id)
    }

    /// Looks up a Detect Air Gap installation by name
    #[must_use]
    pub fn air_gap_installation(&self, name: &str) -> Option<&ToolInstallation> {
        self.air_gap_installations.iter().find(|i| i.name == name)
    }
}

impl Validate for GlobalConfig {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if let Some(url) = self
            .blackduck
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
        {
            validate_url(url)?;
        }
        if self.blackduck.timeout == 0 {
            return Err(ValidationError::InvalidTimeout { value: 0 });
        }
        if let Some(id) = self.blackduck.credentials_id.as_deref()
            && !id.trim().is_empty()
            && self.credentials(id).is_none()
        {
            return Err(ValidationError::UnknownCredentials(id.to_string()));
        }

        validate_url(&self.script_urls.unix)?;
        validate_url(&self.script_urls.windows)?;

        if let Some(proxy) = &self.proxy {
            if proxy.port == 0 {
                return Err(ValidationError::InvalidProxyPort(proxy.port));
            }
            if let Some(id) = proxy.credentials_id.as_deref()
                && !id.trim().is_empty()
                && self.credentials(id).is_none()
            {
                return Err(ValidationError::UnknownCredentials(id.to_string()));
            }
        }

        let mut names = HashSet::new();
        for installation in &self.air_gap_installations {
            if !names.insert(installation.name.as_str()) {
                return Err(ValidationError::DuplicateInstallation(
                    installation.name.clone(),
                ));
            }
            if installation.home.as_os_str().is_empty() {
                return Err(ValidationError::EmptyInstallationHome(
                    installation.name.clone(),
                ));
            }
        }

        if let DownloadStrategy::AirGap { installation_name } = &self.download_strategy
            && self.air_gap_installation(installation_name).is_none()
        {
            return Err(ValidationError::UnknownInstallation(
                installation_name.clone(),
            ));
        }

        Ok(())
    }
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Black Duck server connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackDuckSettings {
    /// Server URL
    pub url: Option<String>,

    /// Id of the credentials used to authenticate
    pub credentials_id: Option<String>,

    /// Connection timeout in seconds
    pub timeout: u64,

    /// Trust the server certificate even if it is not signed by a known CA
    pub trust_certificates: bool,
}

impl Default for BlackDuckSettings {
    fn default() -> Self {
        Self {
            url: None,
            credentials_id: None,
            timeout: 120,
            trust_certificates: false,
        }
    }
}

/// Bootstrap script locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptUrls {
    /// Bash script for unix agents
    pub unix: String,

    /// PowerShell script for Windows agents
    pub windows: String,
}

impl Default for ScriptUrls {
    fn default() -> Self {
        Self {
            unix: DEFAULT_UNIX_SCRIPT_URL.to_string(),
            windows: DEFAULT_WINDOWS_SCRIPT_URL.to_string(),
        }
    }
}

impl ScriptUrls {
    /// Script URL for an agent's shell
    #[must_use]
    pub fn for_agent(&self, is_unix: bool) -> &str {
        if is_unix { &self.unix } else { &self.windows }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Proxy host
    pub host: String,

    /// Proxy port
    pub port: u16,

    /// Credentials used to authenticate with the proxy
    #[serde(default)]
    pub credentials_id: Option<String>,

    /// NTLM domain
    #[serde(default)]
    pub ntlm_domain: Option<String>,

    /// NTLM workstation
    #[serde(default)]
    pub ntlm_workstation: Option<String>,

    /// Hosts reached without the proxy, `*` matches any run of characters
    #[serde(default)]
    pub no_proxy_hosts: Vec<String>,
}

impl ProxySettings {
    /// Proxy URL suitable for an HTTP client
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Returns true if `host` matches one of the no-proxy patterns
    #[must_use]
    pub fn bypasses(&self, host: &str) -> bool {
        self.no_proxy_hosts
            .iter()
            .filter(|p| !p.trim().is_empty())
            .any(|pattern| glob_matches(pattern.trim(), host))
    }
}

fn glob_matches(pattern: &str, host: &str) -> bool {
    let regex = format!("(?i)^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    Regex::new(&regex).is_ok_and(|re| re.is_match(host))
}

/// A stored credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    /// A single secret, used as an API token
    SecretText {
        /// Credentials id
        id: String,
        /// The secret
        secret: String,
    },

    /// Username and password pair
    UsernamePassword {
        /// Credentials id
        id: String,
        /// Username
        username: String,
        /// Password
        password: String,
    },
}

impl Credentials {
    /// Credentials id
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::SecretText { id, .. } | Self::UsernamePassword { id, .. } => id,
        }
    }

    /// Username and password, if this is a username/password credential
    #[must_use]
    pub fn username_password(&self) -> Option<(&str, &str)> {
        match self {
            Self::UsernamePassword {
                username, password, ..
            } => Some((username, password)),
            Self::SecretText { .. } => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecretText { id, .. } => f
                .debug_struct("SecretText")
                .field("id", id)
                .field("secret", &"********")
                .finish(),
            Self::UsernamePassword { id, username, .. } => f
                .debug_struct("UsernamePassword")
                .field("id", id)
                .field("username", username)
                .field("password", &"********")
                .finish(),
        }
    }
}

/// A Detect Air Gap tool installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInstallation {
    /// Installation name referenced by download strategies
    pub name: String,

    /// Directory holding the Detect jar
    pub home: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
blackduck:
  url: https://blackduck.example.com
  credentials_id: bd-token
  timeout: 300
  trust_certificates: true
download_strategy:
  type: air_gap
  installation_name: detect-10
proxy:
  host: proxy.example.com
  port: 3128
  credentials_id: proxy-user
  no_proxy_hosts: ["*.internal", "localhost"]
credentials:
  - kind: secret_text
    id: bd-token
    secret: s3cr3t
  - kind: username_password
    id: proxy-user
    username: alice
    password: hunter2
air_gap_installations:
  - name: detect-10
    home: /opt/detect-10
jdk_home: /usr/lib/jvm/java-17
"#;

    #[test]
    fn test_config_default() {
        let config = GlobalConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.download_strategy, DownloadStrategy::ScriptOrJar);
        assert_eq!(config.blackduck.timeout, 120);
        assert_eq!(config.script_urls.unix, DEFAULT_UNIX_SCRIPT_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let config = GlobalConfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(
            config.blackduck.url.as_deref(),
            Some("https://blackduck.example.com")
        );
        assert_eq!(config.blackduck.timeout, 300);
        assert!(config.blackduck.trust_certificates);
        assert_eq!(
            config.air_gap_installation("detect-10").unwrap().home,
            PathBuf::from("/opt/detect-10")
        );
        assert_eq!(
            config.credentials("proxy-user").unwrap().username_password(),
            Some(("alice", "hunter2"))
        );
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = GlobalConfig::load(&path).unwrap();
        assert_eq!(config.jdk_home, Some(PathBuf::from("/usr/lib/jvm/java-17")));
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = GlobalConfig::load(Path::new("/nonexistent/detect.yaml")).unwrap_err();
        assert!(matches!(err, DetectError::Config(_)));
    }

    #[test]
    fn test_config_invalid_yaml() {
        let err = GlobalConfig::from_yaml("blackduck: [").unwrap_err();
        assert!(matches!(err, DetectError::Config(_)));
    }

    #[test]
    fn test_validate_unknown_credentials() {
        let mut config = GlobalConfig::default();
        config.blackduck.credentials_id = Some("missing".to_string());
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownCredentials("missing".to_string()))
        );
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = GlobalConfig::default();
        config.blackduck.url = Some("not a url".to_string());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("explicit.yaml");
        std::fs::write(&explicit, "log_level: debug\n").unwrap();
        std::fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), "log_level: trace\n").unwrap();

        let config = GlobalConfig::discover_from(
            Some(explicit.to_string_lossy().into_owned()),
            temp_dir.path(),
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_discover_falls_back_to_local_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), "log_level: trace\n").unwrap();

        let config = GlobalConfig::discover_from(Some("  ".to_string()), temp_dir.path()).unwrap();

        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_discover_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();

        let config = GlobalConfig::discover_from(None, temp_dir.path()).unwrap();

        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_discover_explicit_path_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), "log_level: trace\n").unwrap();

        let result = GlobalConfig::discover_from(
            Some("/nonexistent/detect-runner.yaml".to_string()),
            temp_dir.path(),
        );

        assert!(matches!(result, Err(DetectError::Config(_))));
    }

    #[test]
    fn test_validate_blank_url_is_unset() {
        let mut config = GlobalConfig::default();
        config.blackduck.url = Some("  ".to_string());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_proxy_port() {
        let config = GlobalConfig {
            proxy: Some(ProxySettings {
                host: "proxy".to_string(),
                port: 0,
                credentials_id: None,
                ntlm_domain: None,
                ntlm_workstation: None,
                no_proxy_hosts: Vec::new(),
            }),
            ..GlobalConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidProxyPort(0)));
    }

    #[test]
    fn test_validate_empty_installation_home() {
        let mut config = GlobalConfig::default();
        config.air_gap_installations = vec![ToolInstallation {
            name: "detect".to_string(),
            home: PathBuf::new(),
        }];
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyInstallationHome("detect".to_string()))
        );
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = GlobalConfig::default();
        config.blackduck.timeout = 0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTimeout { value: 0 })
        );
    }

    #[test]
    fn test_validate_duplicate_installation() {
        let mut config = GlobalConfig::default();
        let installation = ToolInstallation {
            name: "detect".to_string(),
            home: PathBuf::from("/opt/detect"),
        };
        config.air_gap_installations = vec![installation.clone(), installation];
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateInstallation("detect".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_default_installation() {
        let config = GlobalConfig {
            download_strategy: DownloadStrategy::AirGap {
                installation_name: "nowhere".to_string(),
            },
            ..GlobalConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownInstallation("nowhere".to_string()))
        );
    }

    #[test]
    fn test_proxy_bypass_patterns() {
        let proxy = ProxySettings {
            host: "proxy".to_string(),
            port: 8080,
            credentials_id: None,
            ntlm_domain: None,
            ntlm_workstation: None,
            no_proxy_hosts: vec!["*.internal".to_string(), "LOCALHOST".to_string()],
        };

        assert!(proxy.bypasses("blackduck.internal"));
        assert!(proxy.bypasses("localhost"));
        assert!(!proxy.bypasses("blackduck.example.com"));
        assert!(!proxy.bypasses("internal"));
        assert_eq!(proxy.url(), "http://proxy:8080");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::SecretText {
            id: "token".to_string(),
            secret: "s3cr3t".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("token"));
        assert!(!debug.contains("s3cr3t"));
    }
}
