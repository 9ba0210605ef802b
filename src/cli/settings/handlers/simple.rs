//! Handlers for settings that take one value from a fixed set or range.

use std::fmt::Display;
use std::str::FromStr;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::{Config, FontSize, Theme};
use crate::core::gateway::response::DEFAULT_CONFIDENCE;
use crate::core::style::StyleProfile;

/// Handler for enum-valued settings parsed with `FromStr`.
pub struct ChoiceHandler<T: 'static> {
    key: &'static str,
    example: &'static str,
    choices: &'static [T],
    get: fn(&Config) -> Option<T>,
    set_field: fn(&mut Config, Option<T>),
}

impl<T> ChoiceHandler<T>
where
    T: Copy + Default + Display,
{
    fn choice_list(&self) -> String {
        self.choices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<T> SettingHandler for ChoiceHandler<T>
where
    T: Copy + Default + Display + FromStr + Send + Sync + 'static,
{
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let input = args.join(" ");
        if input.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "Specify one of the available values:",
                example: self.example,
            });
        }

        let value = input
            .parse::<T>()
            .map_err(|_| SettingError::InvalidValue {
                key: self.key,
                input: input.clone(),
                expected: format!("Expected one of: {}", self.choice_list()),
            })?;
        let set_field = self.set_field;

        mutate_config_with_message(
            ctx.config,
            move |config| set_field(config, Some(value)),
            success_set(self.key, &value.to_string()),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.config,
            move |config| set_field(config, None),
            success_unset(self.key, &T::default().to_string()),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, T::default()),
        }
    }
}

pub fn theme_handler() -> ChoiceHandler<Theme> {
    ChoiceHandler {
        key: "theme",
        example: "causerie set theme dark",
        choices: &[Theme::Light, Theme::Dark],
        get: |c| c.theme,
        set_field: |c, v| c.theme = v,
    }
}

pub fn font_size_handler() -> ChoiceHandler<FontSize> {
    ChoiceHandler {
        key: "font-size",
        example: "causerie set font-size large",
        choices: &FontSize::ALL,
        get: |c| c.font_size,
        set_field: |c, v| c.font_size = v,
    }
}

pub fn style_handler() -> ChoiceHandler<StyleProfile> {
    ChoiceHandler {
        key: "style",
        example: "causerie set style concise",
        choices: &StyleProfile::ALL,
        get: |c| c.style,
        set_field: |c, v| c.style = v,
    }
}

/// Handler for the `default-confidence` setting, a number in `0..=1`.
pub struct DefaultConfidenceHandler;

impl SettingHandler for DefaultConfidenceHandler {
    fn key(&self) -> &'static str {
        "default-confidence"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let input = args.join(" ");
        if input.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set the confidence shown when the API reports none, give a number between 0 and 1:",
                example: "causerie set default-confidence 0.8",
            });
        }

        let value = input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| (0.0..=1.0).contains(value))
            .ok_or_else(|| SettingError::InvalidValue {
                key: "default-confidence",
                input: input.clone(),
                expected: "Expected a number between 0 and 1".to_string(),
            })?;

        mutate_config_with_message(
            ctx.config,
            move |config| config.default_confidence = Some(value),
            success_set("default-confidence", &format!("{value:.2}")),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config,
            |config| config.default_confidence = None,
            success_unset("default-confidence", &format!("{DEFAULT_CONFIDENCE:.2}")),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.default_confidence {
            Some(value) => format!("  default-confidence: {value:.2}"),
            None => format!("  default-confidence: (unset, default: {DEFAULT_CONFIDENCE:.2})"),
        }
    }
}
