//! Configuration data types.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::validation;
use crate::domain::filters::{FilterArgs, FilterContext};
use crate::domain::ReportingPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enable debug logging to file
    pub debug: bool,

    /// Path to log directory
    pub log_path: PathBuf,

    /// Filter selections instead of the whole document
    pub use_selections: bool,

    /// Show invocation errors as status messages
    pub errors_on_statusbar: bool,

    /// Show a message when text was replaced
    pub report_success: bool,

    /// Show a message when a filter failed
    pub report_failure: bool,

    /// Show a message when nothing changed
    pub report_nochange: bool,

    /// Default time limit for process filters, 0 for none
    pub process_timeout_secs: u64,

    /// Declared filter commands
    #[serde(default)]
    pub commands: Vec<CommandDeclaration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            log_path: default_log_path(),
            use_selections: true,
            errors_on_statusbar: true,
            report_success: true,
            report_failure: true,
            report_nochange: true,
            process_timeout_secs: 60,
            commands: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration and return errors if invalid.
    /// Delegates to the comprehensive validation module.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Find a declared command by caption.
    pub fn command(&self, caption: &str) -> Option<&CommandDeclaration> {
        self.commands.iter().find(|c| c.caption == caption)
    }

    /// Filter construction settings derived from this configuration.
    pub fn filter_context(&self) -> FilterContext {
        FilterContext {
            process_timeout: match self.process_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    /// Default reporting toggles.
    pub fn reporting(&self) -> ReportingPolicy {
        ReportingPolicy {
            report_success: self.report_success,
            report_failure: self.report_failure,
            report_nochange: self.report_nochange,
        }
    }
}

/// A named, parameterized filter invocation.
///
/// # Examples
///
/// ```toml
/// [[commands]]
/// caption = "Swap Quotes"
/// filter_id = "translate"
/// args = { before = "'\"", after = "\"'" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandDeclaration {
    /// Name the command is invoked by
    pub caption: String,

    /// Registry id of the filter to run
    #[serde(alias = "filter")]
    pub filter_id: String,

    /// Options applied to the filter (and invocation toggles)
    #[serde(default)]
    pub args: toml::Table,
}

impl CommandDeclaration {
    pub fn filter_args(&self) -> FilterArgs {
        FilterArgs::from_table(self.args.clone())
    }
}

/// Get default log path (relative to config directory).
/// This returns a placeholder; the actual path is set by ConfigService based on config file location.
pub fn default_log_path() -> PathBuf {
    default_log_path_for_config_dir(None)
}

/// Get log path based on config directory.
pub fn default_log_path_for_config_dir(config_dir: Option<&Path>) -> PathBuf {
    config_dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("filter-pipes")
        })
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.use_selections);
        assert!(config.report_failure);
        assert_eq!(config.process_timeout_secs, 60);
        assert!(config.commands.is_empty());
    }

    #[test]
    fn test_parse_commands() {
        let config: Config = toml::from_str(
            r#"
            report_nochange = false
            process_timeout_secs = 0

            [[commands]]
            caption = "Swap Quotes"
            filter_id = "translate"
            args = { before = "'\"", after = "\"'" }

            [[commands]]
            caption = "Reverse Words"
            filter = "reverse_words"
            "#,
        )
        .unwrap();

        assert!(!config.reporting().report_nochange);
        assert!(config.filter_context().process_timeout.is_none());
        assert_eq!(config.commands.len(), 2);

        let swap = config.command("Swap Quotes").unwrap();
        assert_eq!(swap.filter_id, "translate");
        assert_eq!(
            swap.filter_args().get_str("before").unwrap(),
            Some("'\"".to_string())
        );

        let reverse = config.command("Reverse Words").unwrap();
        assert_eq!(reverse.filter_id, "reverse_words");
        assert!(reverse.args.is_empty());
        assert!(config.command("Missing").is_none());
    }
}
