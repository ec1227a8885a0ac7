//! # Output Configuration
//!
//! Controls how the CLI decorates its output: status marks are emoji on a
//! colour terminal and bracketed words (`[OK]`, `[ERR]`) otherwise, and
//! release names are highlighted only when colour is on.
//!
//! The decision follows the `--color=never|always|auto` flag. In `auto`
//! mode the usual environment conventions apply: `NO_COLOR`, `CLICOLOR=0`,
//! `CLICOLOR_FORCE=1` and `TERM=dumb`, then TTY detection.
//!
//! ```rust,ignore
//! use deploy_local::output::{Mark, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Activated {}", out.mark(Mark::Ok), out.highlight("20240101000000"));
//! ```

use std::env;

/// Status marks printed in front of CLI messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Ok,
    Err,
    Warn,
    Info,
    Step,
    Removed,
}

impl Mark {
    fn emoji(self) -> &'static str {
        match self {
            Mark::Ok => "✅",
            Mark::Err => "❌",
            Mark::Warn => "⚠️",
            Mark::Info => "📦",
            Mark::Step => "🚀",
            Mark::Removed => "🗑️",
        }
    }

    fn plain(self) -> &'static str {
        match self {
            Mark::Ok => "[OK]",
            Mark::Err => "[ERR]",
            Mark::Warn => "[WARN]",
            Mark::Info => "[INFO]",
            Mark::Step => "[STEP]",
            Mark::Removed => "[DEL]",
        }
    }
}

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Build the configuration from the `--color` flag value ("always",
    /// "never" or "auto") and, for "auto", the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colour, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// The mark to print for `mark`.
    pub fn mark(&self, mark: Mark) -> &'static str {
        if self.use_color {
            mark.emoji()
        } else {
            mark.plain()
        }
    }

    /// `text` in bold when colour is on, unchanged otherwise.
    pub fn highlight(&self, text: impl std::fmt::Display) -> String {
        if self.use_color {
            console::style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
