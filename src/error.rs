//! # Error Handling
//!
//! This module defines the centralized error type for the `deploy-local`
//! library. It uses `thiserror` to build an `Error` enum that covers every
//! failure a deploy run can hit, each variant carrying enough context (paths,
//! commands, exit codes) to diagnose the failing stage from the message alone.
//!
//! ## Taxonomy
//!
//! - **Configuration**: a required variable is missing or a value is invalid
//!   (`Config`, `ConfigParse`, `Yaml`, `Template`).
//! - **Filesystem**: creating, removing or linking something under the deploy
//!   root failed (`Filesystem`, `Io`).
//! - **Command failure**: an external process exited non-zero, timed out or
//!   could not be spawned (`CommandFailed`, `CommandTimeout`, `CommandSpawn`).
//!   `GitClone` is the final form of a failed checkout.
//! - **Allocation**: every collision suffix for a release name is taken
//!   (`AllocationExhausted`).
//!
//! Filesystem and allocation errors always abort the run. Command failures
//! abort the run too, except inside the checkout engine where exactly one
//! fallback clone is attempted first.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for deploy-local operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration
        hint: Option<String>,
    },

    /// The configuration file could not be interpreted.
    #[error("Configuration parsing error: {message}")]
    ConfigParse { message: String },

    /// A filesystem operation on the deploy root failed.
    #[error("Filesystem error: {operation} {}: {source}", path.display())]
    Filesystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external command exited with a non-zero status.
    #[error("Command failed{}: {command}{}", exit_suffix(code), output_suffix(output))]
    CommandFailed {
        command: String,
        /// Exit code, `None` when the process was killed by a signal
        code: Option<i32>,
        /// Combined stdout and stderr of the process
        output: String,
    },

    /// An external command ran longer than its wall-time ceiling.
    #[error("Command timed out after {timeout_secs}s: {command}")]
    CommandTimeout { command: String, timeout_secs: u64 },

    /// An external command could not be started at all.
    #[error("Failed to spawn command: {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Every collision suffix for a release name is already in use.
    #[error("Release allocation exhausted suffix space for {base} after {attempts} attempts")]
    AllocationExhausted { base: String, attempts: u32 },

    /// Cloning the repository into a release failed for good.
    #[error("Git clone error for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A `{{name}}` placeholder could not be rendered.
    #[error("Template processing error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Build a `Filesystem` error for `operation` on `path`.
    pub fn filesystem(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Build a `Config` error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Whether this error came from an external process (non-zero exit,
    /// timeout or spawn failure).
    pub fn is_command_failure(&self) -> bool {
        matches!(
            self,
            Error::CommandFailed { .. } | Error::CommandTimeout { .. } | Error::CommandSpawn { .. }
        )
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with exit code {}", c))
        .unwrap_or_default()
}

fn output_suffix(output: &str) -> String {
    if output.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", output.trim_end())
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let error = Error::config("repository is not set");
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("repository is not set"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "repository is not set".to_string(),
            hint: Some("Add 'repository:' to .deploy-local.yaml".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("Add 'repository:'"));
    }

    #[test]
    fn test_error_display_filesystem() {
        let error = Error::filesystem(
            "create directory",
            "/srv/app/releases",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let display = format!("{}", error);
        assert!(display.contains("Filesystem error"));
        assert!(display.contains("create directory"));
        assert!(display.contains("/srv/app/releases"));
        assert!(display.contains("denied"));
    }

    #[test]
    fn test_error_display_command_failed() {
        let error = Error::CommandFailed {
            command: "git clone repo dest".to_string(),
            code: Some(128),
            output: "fatal: repository not found\n".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("exit code 128"));
        assert!(display.contains("git clone repo dest"));
        assert!(display.contains("fatal: repository not found"));
    }

    #[test]
    fn test_error_display_command_failed_by_signal() {
        let error = Error::CommandFailed {
            command: "sleep 10".to_string(),
            code: None,
            output: String::new(),
        };
        let display = format!("{}", error);
        assert_eq!(display, "Command failed: sleep 10");
    }

    #[test]
    fn test_error_display_command_timeout() {
        let error = Error::CommandTimeout {
            command: "git clone".to_string(),
            timeout_secs: 60,
        };
        assert!(format!("{}", error).contains("timed out after 60s"));
    }

    #[test]
    fn test_error_display_allocation_exhausted() {
        let error = Error::AllocationExhausted {
            base: "20240101000000".to_string(),
            attempts: 43,
        };
        let display = format!("{}", error);
        assert!(display.contains("exhausted suffix space"));
        assert!(display.contains("20240101000000"));
    }

    #[test]
    fn test_error_display_git_clone_with_hint() {
        let error = Error::GitClone {
            url: "https://github.com/test/repo.git".to_string(),
            r#ref: "main".to_string(),
            message: "Authentication failed".to_string(),
            hint: Some("Check SSH keys".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Git clone error"));
        assert!(display.contains("https://github.com/test/repo.git@main"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_error_template_with_variable() {
        let error = Error::Template {
            message: "Undefined variable".to_string(),
            variable: Some("release_path".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Template processing error"));
        assert!(display.contains("(variable: release_path)"));
    }

    #[test]
    fn test_is_command_failure() {
        let timeout = Error::CommandTimeout {
            command: "x".to_string(),
            timeout_secs: 1,
        };
        assert!(timeout.is_command_failure());
        assert!(!Error::config("x").is_command_failure());
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!io.is_command_failure());
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
