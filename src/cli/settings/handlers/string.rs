//! String setting handlers for text-based settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::Config;
use crate::core::gateway::response::DEFAULT_THOUGHT_MARKER;
use crate::core::gateway::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_VISION_MODEL};
use crate::utils::url::validate_base_url;

/// Data-driven handler for free-form string settings.
pub struct StringHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    get: fn(&Config) -> Option<&str>,
    set_field: fn(&mut Config, Option<String>),
    /// Turns the raw input into the stored value, or explains what is expected.
    normalize: fn(&str) -> Result<String, String>,
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let input = args.join(" ");
        if input.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let value = (self.normalize)(&input).map_err(|expected| SettingError::InvalidValue {
            key: self.key,
            input: input.clone(),
            expected,
        })?;
        let message = success_set(self.key, &value);
        let set_field = self.set_field;

        mutate_config_with_message(ctx.config, move |config| set_field(config, Some(value)), message)
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.config,
            move |config| set_field(config, None),
            success_unset(self.key, self.default_display),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

fn trimmed(input: &str) -> Result<String, String> {
    Ok(input.trim().to_string())
}

fn single_word(input: &str) -> Result<String, String> {
    let value = input.trim();
    if value.contains(char::is_whitespace) {
        return Err("Model names cannot contain spaces".to_string());
    }
    Ok(value.to_string())
}

pub fn base_url_handler() -> StringHandler {
    StringHandler {
        key: "base-url",
        hint: "To point at another OpenAI-compatible API, give its base URL:",
        example: "causerie set base-url https://api.x.ai/v1",
        default_display: DEFAULT_BASE_URL,
        get: |c| c.base_url.as_deref(),
        set_field: |c, v| c.base_url = v,
        normalize: validate_base_url,
    }
}

pub fn model_handler() -> StringHandler {
    StringHandler {
        key: "model",
        hint: "To set the chat model, specify its name:",
        example: "causerie set model grok-2-latest",
        default_display: DEFAULT_MODEL,
        get: |c| c.model.as_deref(),
        set_field: |c, v| c.model = v,
        normalize: single_word,
    }
}

pub fn vision_model_handler() -> StringHandler {
    StringHandler {
        key: "vision-model",
        hint: "To set the model used for image turns, specify its name:",
        example: "causerie set vision-model grok-2-vision-latest",
        default_display: DEFAULT_VISION_MODEL,
        get: |c| c.vision_model.as_deref(),
        set_field: |c, v| c.vision_model = v,
        normalize: single_word,
    }
}

pub fn thought_marker_handler() -> StringHandler {
    StringHandler {
        key: "thought-marker",
        hint: "To change the marker that introduces reasoning, give the marker text:",
        example: "causerie set thought-marker \"Reasoning:\"",
        default_display: DEFAULT_THOUGHT_MARKER,
        get: |c| c.thought_marker.as_deref(),
        set_field: |c, v| c.thought_marker = v,
        normalize: trimmed,
    }
}
