//! Build script assembly
//!
//! Every artifact of a plan embeds the same assembled script. This module
//! renders it once from the recipe and derives the standalone variants the
//! container definitions need.

pub mod assembler;
pub mod bundle;
pub mod git;
pub mod keystore;
pub mod packages;
pub mod substitution;
pub mod templates;

pub use assembler::{assemble, AssembledScript};
pub use bundle::ScriptBundle;
pub use git::git_checkout_script;
pub use keystore::{install_keystore_script, run_in_processor};
pub use packages::{install_packages, PackageSection};
pub use substitution::{extract_array_param, extract_env_vars, ParameterSubstitutor};

use serde::Serialize;
use std::fmt;

/// A problem found while assembling a script that is reported by the
/// script itself when it runs, instead of failing generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredFailure {
    /// What the failure belongs to, e.g. `build tool` or `package <uri>`.
    pub component: String,
    pub message: String,
}

impl DeferredFailure {
    pub fn build_tool(message: String) -> Self {
        Self {
            component: "build tool".to_string(),
            message,
        }
    }

    pub fn package(uri: &str, message: String) -> Self {
        Self {
            component: format!("package {}", uri),
            message,
        }
    }

    /// `echo '<message>' && exit 1`
    pub fn shell_line(&self) -> String {
        format!("echo {} && exit 1", shell_single_quote(&self.message))
    }
}

impl fmt::Display for DeferredFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.message)
    }
}

/// Quotes a value for POSIX shells.
pub fn shell_single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_line_quotes_message() {
        let failure = DeferredFailure::build_tool("unknown build tool it's".to_string());
        assert_eq!(
            failure.shell_line(),
            r"echo 'unknown build tool it'\''s' && exit 1"
        );
    }

    #[test]
    fn test_display() {
        let failure = DeferredFailure::package("https://x/y.rpm", "missing".to_string());
        assert_eq!(failure.to_string(), "package https://x/y.rpm: missing");
    }
}
