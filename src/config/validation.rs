//! Configuration validation.

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use super::Config;
use crate::domain::filters::FilterRegistry;
use crate::service::InvocationOptions;

/// Validate configuration against the built-in filter registry.
pub fn validate(config: &Config) -> Result<()> {
    validate_with(config, &FilterRegistry::with_builtins())
}

/// Validate configuration.
///
/// Every declared command must build successfully, so option errors
/// surface here rather than when the command is first run.
pub fn validate_with(config: &Config, registry: &FilterRegistry) -> Result<()> {
    if !config.log_path.as_os_str().is_empty() && config.log_path.to_string_lossy().contains('\0')
    {
        bail!("Invalid log_path: contains null character");
    }

    let context = config.filter_context();
    let mut captions = BTreeSet::new();

    for (i, command) in config.commands.iter().enumerate() {
        if command.caption.trim().is_empty() {
            bail!("commands[{}]: caption cannot be empty", i);
        }

        if !captions.insert(command.caption.as_str()) {
            bail!("commands[{}]: duplicate caption '{}'", i, command.caption);
        }

        if !registry.contains(&command.filter_id) {
            bail!(
                "commands[{}] '{}': unknown filter_id '{}'; available: {}",
                i,
                command.caption,
                command.filter_id,
                registry.ids().collect::<Vec<_>>().join(", ")
            );
        }

        let mut args = command.filter_args();
        if let Err(e) = InvocationOptions::split_from(&mut args, config) {
            bail!("commands[{}] '{}': {}", i, command.caption, e);
        }

        if let Err(e) = registry.build(&command.filter_id, &args, &context) {
            bail!("commands[{}] '{}': {}", i, command.caption, e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Config {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let config = parse(
            r#"
            [[commands]]
            caption = "Hex"
            filter_id = "int_base"
            args = { from_base = 10, to_base = 16, use_selections = false }
            "#,
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_filter_id() {
        let config = parse(
            r#"
            [[commands]]
            caption = "X"
            filter_id = "nope"
            "#,
        );
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("unknown filter_id 'nope'"));
    }

    #[test]
    fn test_duplicate_caption() {
        let config = parse(
            r#"
            [[commands]]
            caption = "X"
            filter_id = "snake_case"

            [[commands]]
            caption = "X"
            filter_id = "camel_case"
            "#,
        );
        assert!(validate(&config)
            .unwrap_err()
            .to_string()
            .contains("duplicate caption"));
    }

    #[test]
    fn test_bad_options_fail_fast() {
        let config = parse(
            r#"
            [[commands]]
            caption = "Octal"
            filter_id = "int_base"
            args = { from_base = 3 }
            "#,
        );
        assert!(validate(&config)
            .unwrap_err()
            .to_string()
            .contains("unsupported base 3"));

        let config = parse(
            r#"
            [[commands]]
            caption = "Bad regex"
            filter_id = "regex"
            args = { regex = "(", replacement = "" }
            "#,
        );
        assert!(validate(&config).is_err());

        let config = parse(
            r#"
            [[commands]]
            caption = "Bad toggle"
            filter_id = "snake_case"
            args = { report_success = "yes" }
            "#,
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_caption() {
        let config = parse(
            r#"
            [[commands]]
            caption = " "
            filter_id = "snake_case"
            "#,
        );
        assert!(validate(&config).is_err());
    }
}
