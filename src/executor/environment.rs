//! Environment assembly for the Detect process
//!
//! Detect reads its Black Duck connection settings from environment
//! variables, so the runner translates the global configuration into
//! `BLACKDUCK_*` variables on top of the node and build environments.

use crate::infrastructure::{Credentials, GlobalConfig};
use crate::pipeline::DetectError;
use std::collections::HashMap;

/// Black Duck server URL
pub const BLACKDUCK_URL: &str = "BLACKDUCK_URL";
/// Black Duck API token
pub const BLACKDUCK_API_TOKEN: &str = "BLACKDUCK_API_TOKEN";
/// Black Duck username
pub const BLACKDUCK_USERNAME: &str = "BLACKDUCK_USERNAME";
/// Black Duck password
pub const BLACKDUCK_PASSWORD: &str = "BLACKDUCK_PASSWORD";
/// Black Duck connection timeout in seconds
pub const BLACKDUCK_TIMEOUT: &str = "BLACKDUCK_TIMEOUT";
/// Trust the Black Duck certificate
pub const BLACKDUCK_TRUST_CERT: &str = "BLACKDUCK_TRUST_CERT";
/// Proxy host
pub const BLACKDUCK_PROXY_HOST: &str = "BLACKDUCK_PROXY_HOST";
/// Proxy port
pub const BLACKDUCK_PROXY_PORT: &str = "BLACKDUCK_PROXY_PORT";
/// Proxy username
pub const BLACKDUCK_PROXY_USERNAME: &str = "BLACKDUCK_PROXY_USERNAME";
/// Proxy password
pub const BLACKDUCK_PROXY_PASSWORD: &str = "BLACKDUCK_PROXY_PASSWORD";
/// Proxy NTLM domain
pub const BLACKDUCK_PROXY_NTLM_DOMAIN: &str = "BLACKDUCK_PROXY_NTLM_DOMAIN";
/// Proxy NTLM workstation
pub const BLACKDUCK_PROXY_NTLM_WORKSTATION: &str = "BLACKDUCK_PROXY_NTLM_WORKSTATION";

/// Assembles the environment Detect runs with
///
/// Build variables override node variables, and configured values
/// override both. Blank configuration values are skipped.
///
/// # Errors
///
/// Returns [`DetectError::MissingCredentials`] if a configured credentials
/// id is not in the store.
pub fn assemble_environment(
    node_env: &HashMap<String, String>,
    build_env: &HashMap<String, String>,
    config: &GlobalConfig,
) -> Result<HashMap<String, String>, DetectError> {
    let mut env = node_env.clone();
    env.extend(build_env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let blackduck = &config.blackduck;
    if let Some(url) = non_blank(blackduck.url.as_deref()) {
        env.insert(BLACKDUCK_URL.to_string(), url.to_string());
    }
    env.insert(BLACKDUCK_TIMEOUT.to_string(), blackduck.timeout.to_string());
    env.insert(
        BLACKDUCK_TRUST_CERT.to_string(),
        blackduck.trust_certificates.to_string(),
    );

    if let Some(id) = non_blank(blackduck.credentials_id.as_deref()) {
        match lookup_credentials(config, id)? {
            Credentials::SecretText { secret, .. } => {
                env.insert(BLACKDUCK_API_TOKEN.to_string(), secret.clone());
            }
            Credentials::UsernamePassword {
                username, password, ..
            } => {
                env.insert(BLACKDUCK_USERNAME.to_string(), username.clone());
                env.insert(BLACKDUCK_PASSWORD.to_string(), password.clone());
            }
        }
    }

    if let Some(proxy) = &config.proxy {
        let blackduck_host = env
            .get(BLACKDUCK_URL)
            .and_then(|url| url::Url::parse(url).ok())
            .and_then(|url| url.host_str().map(str::to_string));

        if blackduck_host.as_deref().is_some_and(|host| proxy.bypasses(host)) {
            tracing::debug!(host = ?blackduck_host, "Black Duck host bypasses the proxy");
        } else {
            env.insert(BLACKDUCK_PROXY_HOST.to_string(), proxy.host.clone());
            env.insert(BLACKDUCK_PROXY_PORT.to_string(), proxy.port.to_string());

            if let Some(id) = non_blank(proxy.credentials_id.as_deref())
                && let Some((username, password)) =
                    lookup_credentials(config, id)?.username_password()
            {
                env.insert(BLACKDUCK_PROXY_USERNAME.to_string(), username.to_string());
                env.insert(BLACKDUCK_PROXY_PASSWORD.to_string(), password.to_string());
            }
            if let Some(domain) = non_blank(proxy.ntlm_domain.as_deref()) {
                env.insert(BLACKDUCK_PROXY_NTLM_DOMAIN.to_string(), domain.to_string());
            }
            if let Some(workstation) = non_blank(proxy.ntlm_workstation.as_deref()) {
                env.insert(
                    BLACKDUCK_PROXY_NTLM_WORKSTATION.to_string(),
                    workstation.to_string(),
                );
            }
        }
    }

    Ok(env)
}

/// Proxy username and password from the credentials store
///
/// # Errors
///
/// Returns [`DetectError::MissingCredentials`] if the proxy names an
/// unknown credentials id.
pub fn proxy_credentials(config: &GlobalConfig) -> Result<Option<(String, String)>, DetectError> {
    let Some(id) = config
        .proxy
        .as_ref()
        .and_then(|p| non_blank(p.credentials_id.as_deref()))
    else {
        return Ok(None);
    };

    Ok(lookup_credentials(config, id)?
        .username_password()
        .map(|(u, p)| (u.to_string(), p.to_string())))
}

fn lookup_credentials<'a>(
    config: &'a GlobalConfig,
    id: &str,
) -> Result<&'a Credentials, DetectError> {
    config
        .credentials(id)
        .ok_or_else(|| DetectError::MissingCredentials { id: id.to_string() })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
