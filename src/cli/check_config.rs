//! `detect-runner check-config` - Validate the global configuration
//!
//! Loads the configuration the step commands would use, validates it and
//! prints a summary. Secrets are never printed.
//!
//! ## Usage
//!
//! ```bash
//! detect-runner check-config --config /etc/detect-runner.yaml
//! # Exit code 0: configuration is valid
//! # Exit code 1: configuration could not be loaded or is invalid
//! ```

use super::step::load_config;
use anyhow::Result;
use detect_runner::GlobalConfig;
use std::fmt::Write as _;
use std::path::Path;

/// Loads, validates and summarizes the configuration
pub fn check_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    print!("{}", summarize(&config));
    println!("Configuration is valid");
    Ok(())
}

/// Human-readable summary of a configuration
pub fn summarize(config: &GlobalConfig) -> String {
    let mut out = String::new();
    let not_set = "(not set)";

    let _ = writeln!(
        out,
        "Black Duck URL:      {}",
        config.blackduck.url.as_deref().unwrap_or(not_set)
    );
    let _ = writeln!(
        out,
        "Credentials:         {}",
        config.blackduck.credentials_id.as_deref().unwrap_or(not_set)
    );
    let _ = writeln!(out, "Timeout:             {}s", config.blackduck.timeout);
    let _ = writeln!(
        out,
        "Trust certificates:  {}",
        config.blackduck.trust_certificates
    );
    let _ = writeln!(out, "Download strategy:   {}", config.download_strategy);
    let _ = writeln!(out, "Script (unix):       {}", config.script_urls.unix);
    let _ = writeln!(out, "Script (windows):    {}", config.script_urls.windows);
    match &config.proxy {
        Some(proxy) => {
            let _ = writeln!(out, "Proxy:               {}", proxy.url());
        }
        None => {
            let _ = writeln!(out, "Proxy:               {not_set}");
        }
    }
    let _ = writeln!(
        out,
        "Air Gap installations: {}",
        config.air_gap_installations.len()
    );
    for installation in &config.air_gap_installations {
        let _ = writeln!(
            out,
            "  - {} ({})",
            installation.name,
            installation.home.display()
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_installations_without_secrets() {
        let config = GlobalConfig::from_yaml(
            r"
blackduck:
  url: https://blackduck.example.com
  credentials_id: bd-token
credentials:
  - kind: secret_text
    id: bd-token
    secret: s3cr3t
air_gap_installations:
  - name: detect-10
    home: /opt/detect
",
        )
        .unwrap();

        let summary = summarize(&config);

        assert!(summary.contains("Black Duck URL:      https://blackduck.example.com"));
        assert!(summary.contains("  - detect-10 (/opt/detect)"));
        assert!(!summary.contains("s3cr3t"));
    }
}
