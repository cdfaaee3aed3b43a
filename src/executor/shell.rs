//! Argument primitives with Jenkins compatibility
//!
//! This module turns the free-text Detect properties a user types into a
//! job configuration into a safe argument list:
//!
//! - Tokenizing (`'single'`, `"double"` quotes and backslash escapes)
//! - Macro expansion (`${VAR}` and `$VAR`, `$$` for a literal dollar)
//! - Escaping for the shell that will finally see the arguments
//!
//! ## Macro Expansion
//!
//! ```rust
//! use detect_runner::replace_macros;
//! use std::collections::HashMap;
//!
//! let env = HashMap::from([("BUILD_NUMBER".to_string(), "42".to_string())]);
//! let expanded = replace_macros("--detect.project.version.name=${BUILD_NUMBER}", &env);
//! assert_eq!(expanded, "--detect.project.version.name=42");
//! ```
//!
//! ## Escaping
//!
//! | Shell | Escape character | Used by |
//! |-------|------------------|---------|
//! | POSIX | `\` | the bash bootstrap script |
//! | PowerShell | `` ` `` | the PowerShell bootstrap script |
//! | none | - | `java -jar` invocations |

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static MACRO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\$|\{([A-Za-z0-9_.]+)\}|([A-Za-z0-9_]+))").expect("valid macro pattern")
});

const POSIX_SPECIAL: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', ' ', '\t', '*', '?', '[', ']',
    '{', '}', '~', '#',
];

const POWERSHELL_SPECIAL: &[char] = &[
    '`', '$', '"', '\'', '(', ')', '{', '}', ';', ',', '|', '&', '<', '>', '@', '#', ' ',
];

/// Shell that will interpret the final arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// A POSIX shell such as bash
    Posix,
    /// Windows PowerShell
    PowerShell,
    /// No shell, arguments reach the program verbatim
    None,
}

impl ShellKind {
    /// Shell used by an agent's bootstrap script
    #[must_use]
    pub fn for_agent(is_unix: bool) -> Self {
        if is_unix { Self::Posix } else { Self::PowerShell }
    }

    /// Escapes one argument so the shell passes it through unchanged
    #[must_use]
    pub fn escape(self, arg: &str) -> String {
        match self {
            Self::Posix => escape_with(arg, '\\', POSIX_SPECIAL),
            Self::PowerShell => escape_with(arg, '`', POWERSHELL_SPECIAL),
            Self::None => arg.to_string(),
        }
    }
}

fn escape_with(arg: &str, escape: char, special: &[char]) -> String {
    let mut escaped = String::with_capacity(arg.len() + 8);
    for c in arg.chars() {
        if special.contains(&c) {
            escaped.push(escape);
        }
        escaped.push(c);
    }
    escaped
}

/// Splits a property string into arguments
///
/// Quotes group words and are removed, a backslash escapes the next
/// character. Input with unbalanced quotes falls back to splitting on
/// whitespace.
#[must_use]
pub fn tokenize(input: &str) -> Vec<String> {
    match shell_words::split(input) {
        Ok(words) => words,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not parse Detect properties, splitting on whitespace"
            );
            input.split_whitespace().map(str::to_string).collect()
        }
    }
}

/// Expands `${VAR}` and `$VAR` macros
///
/// Unknown variables are left as they are and `$$` produces a literal `$`.
/// A substituted value is expanded once more, so a variable that names
/// another variable resolves, but expansion stops there.
#[must_use]
pub fn replace_macros(input: &str, env: &HashMap<String, String>) -> String {
    expand(input, env, 1)
}

fn expand(input: &str, env: &HashMap<String, String>, depth: usize) -> String {
    MACRO_PATTERN
        .replace_all(input, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            if whole == "$$" {
                return "$".to_string();
            }

            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());

            match env.get(name) {
                Some(value) if depth > 0 => expand(value, env, depth - 1),
                Some(value) => value.clone(),
                None => whole.to_string(),
            }
        })
        .into_owned()
}
