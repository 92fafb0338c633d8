//! Configuration service for loading and generating config files.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::default_log_path_for_config_dir;
use super::Config;

/// Configuration service.
pub struct ConfigService;

impl ConfigService {
    /// Get the default configuration file path.
    /// Always uses ~/.config/filter-pipes/config.toml for cross-platform consistency.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("filter-pipes")
            .join("config.toml")
    }

    /// Load configuration from file.
    ///
    /// If `path` is `None`, uses the default path.
    /// If the file doesn't exist, creates default configuration file.
    /// Validates configuration after loading.
    /// Log path defaults to the same directory as config file.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);
        let config_dir = path.parent();

        if !path.exists() {
            Self::generate_at(&path)?;
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // log_path equal to the general default means it was not set in the file
        let general_default = default_log_path_for_config_dir(None);
        if config.log_path == general_default {
            config.log_path = default_log_path_for_config_dir(config_dir);
        }

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Generate default configuration file at the default path.
    pub fn generate_default() -> Result<()> {
        Self::generate_at(&Self::default_path())
    }

    /// Generate default configuration file at the specified path.
    pub fn generate_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = Self::default_config_content();
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Generate default configuration content with comments.
    fn default_config_content() -> String {
        r#"# filter-pipes configuration file

# Filter only the selected regions; when false (or nothing is selected)
# the whole document is filtered (default: true)
use_selections = true

# Show invocation errors as status messages (default: true)
errors_on_statusbar = true

# Status messages per outcome (default: true)
report_success = true
report_failure = true
report_nochange = true

# Kill process filters running longer than this many seconds, 0 = never (default: 60)
process_timeout_secs = 60

# Enable debug logging to file (default: false)
debug = false

# Path to log directory (default: same directory as config.toml/logs)
# log_path = "~/.config/filter-pipes/logs"

# Commands
# Every command binds a caption to a filter and its options. Any command can
# also override use_selections, errors_on_statusbar and the report_* toggles
# in its args.
#
# Filters: translate, regex, int_base, base64, urlencode, escape,
#          camel_case, snake_case, reverse_words, process

# Translate filters map each character of "before" to the character at the
# same position in "after".
[[commands]]
caption = "Swap Quotes"
filter_id = "translate"
args = { before = "'\"", after = "\"'" }

[[commands]]
caption = "Convert to Straight Quotes"
filter_id = "translate"
args = { before = "“”‟〝〞＂„〟‘’‛＇‚", after = "\"\"\"\"\"\"\"\"'''''" }

# Regex filters substitute every match. Backreferences are written \1 or
# \g<name>. Set lines = true so ^ and $ match at every line.
[[commands]]
caption = "Collapse Spaces"
filter_id = "regex"
args = { regex = '\s+', replacement = " " }

# Process filters pipe the text through an external program. A list is run
# directly (first element is the executable); a string is run by the shell.
# expected_return_codes defaults to [0]; an empty list accepts any exit code.
[[commands]]
caption = "Beautify JS (js-beautify)"
filter_id = "process"
args = { command = ["js-beautify", "-i"] }

[[commands]]
caption = "Minify JS (uglifyjs)"
filter_id = "process"
args = { command = ["uglifyjs"] }

[[commands]]
caption = "Sort Lines"
filter_id = "process"
args = { command = "sort", use_selections = true }

# Case and word filters
[[commands]]
caption = "Reverse Words"
filter_id = "reverse_words"

[[commands]]
caption = "to CamelCase"
filter_id = "camel_case"
args = { initial_caps = true }

[[commands]]
caption = "to mixedCase"
filter_id = "camel_case"
args = { initial_caps = false }

[[commands]]
caption = "to underscore_case"
filter_id = "snake_case"

# Encodings
[[commands]]
caption = "Base64 Encode"
filter_id = "base64"
args = { wrap = 64 }

[[commands]]
caption = "Base64 Decode"
filter_id = "base64"
args = { decode = true }

[[commands]]
caption = "URL Encode"
filter_id = "urlencode"

[[commands]]
caption = "URL Decode"
filter_id = "urlencode"
args = { decode = true }

[[commands]]
caption = "Backslash Escape"
filter_id = "escape"

[[commands]]
caption = "Backslash Unescape"
filter_id = "escape"
args = { decode = true }

# Number bases (8, 10 or 16)
# [[commands]]
# caption = "Decimal to Hex"
# filter_id = "int_base"
# args = { from_base = 10, to_base = 16, case = "lower", prefix = true }

# [[commands]]
# caption = "Hex to Decimal"
# filter_id = "int_base"
# args = { from_base = 16, to_base = 10 }
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_is_valid() {
        let config: Config = toml::from_str(&ConfigService::default_config_content()).unwrap();
        config.validate().unwrap();
        assert!(config.command("Swap Quotes").is_some());
        assert!(config.command("to underscore_case").is_some());
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ConfigService::load(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.log_path, dir.path().join("nested").join("logs"));
    }

    #[test]
    fn test_load_rejects_invalid_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[commands]]\ncaption = \"x\"\nfilter_id = \"missing\"\n",
        )
        .unwrap();

        let err = ConfigService::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown filter_id"));
    }
}
