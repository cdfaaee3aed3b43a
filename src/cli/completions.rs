//! `detect-runner completions` - Generate shell completions
//!
//! Supports bash, zsh, fish, and PowerShell.

use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs;
use std::path::Path;

/// Generates the completion script for `shell`
pub fn generate_completions(shell: Shell) -> Result<String> {
    use clap_complete::generate;

    let mut cmd = super::build_cli();
    let bin_name = cmd.get_name().to_string();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, bin_name, &mut buf);

    String::from_utf8(buf).context("Failed to generate completions")
}

/// Writes a completion script to a file
pub fn save_completions(completions: &str, output_path: &Path) -> Result<()> {
    fs::write(output_path, completions)
        .with_context(|| format!("Failed to write completions to: {}", output_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_bash_completions() {
        let completions = generate_completions(Shell::Bash).unwrap();
        assert!(completions.contains("detect-runner"));
        assert!(completions.contains("post-build"));
        assert!(completions.contains("--air-gap-installation"));
    }

    #[test]
    fn test_generate_zsh_completions() {
        let completions = generate_completions(Shell::Zsh).unwrap();
        assert!(completions.contains("check-config"));
    }

    #[test]
    fn test_generate_fish_completions() {
        let completions = generate_completions(Shell::Fish).unwrap();
        assert!(completions.contains("detect-runner"));
    }

    #[test]
    fn test_save_completions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("detect-runner.bash");

        save_completions("complete -F _detect_runner detect-runner", &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "complete -F _detect_runner detect-runner"
        );
    }
}
