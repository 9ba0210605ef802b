//! Helper functions for settings operations.

use crate::core::config::{Config, ConfigOrchestrator};

use super::error::SettingError;

/// Apply `f` through the orchestrator, mapping failures to `SettingError::ConfigError`.
pub fn mutate_config<F>(orchestrator: &ConfigOrchestrator, f: F) -> Result<(), SettingError>
where
    F: FnOnce(&mut Config),
{
    orchestrator
        .mutate(|config| {
            f(config);
            Ok::<_, crate::core::config::ConfigError>(())
        })
        .map_err(|e| SettingError::ConfigError(e.to_string()))
}

/// Like [`mutate_config`], returning `message` on success.
pub fn mutate_config_with_message<F>(
    orchestrator: &ConfigOrchestrator,
    f: F,
    message: String,
) -> Result<String, SettingError>
where
    F: FnOnce(&mut Config),
{
    mutate_config(orchestrator, f)?;
    Ok(message)
}

/// Parse a boolean value from user input.
///
/// Accepts: on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Format a boolean value for display.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub fn success_unset(key: &str, default: &str) -> String {
    format!("✅ Unset {key} (will use default: {default})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for input in ["on", "TRUE", "yes", "1", " On "] {
            assert_eq!(parse_bool(input), Some(true), "{input}");
        }
        for input in ["off", "False", "NO", "0"] {
            assert_eq!(parse_bool(input), Some(false), "{input}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }
}
