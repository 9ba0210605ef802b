use crate::core::config::data::{Config, FontSize, Theme};
use crate::core::gateway::response::{DEFAULT_CONFIDENCE, DEFAULT_THOUGHT_MARKER};
use crate::core::gateway::{
    GatewaySettings, ResponseConventions, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_VISION_MODEL,
};
use crate::core::style::StyleProfile;

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(DEFAULT_VISION_MODEL)
    }

    pub fn theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }

    pub fn font_size(&self) -> FontSize {
        self.font_size.unwrap_or_default()
    }

    pub fn style(&self) -> StyleProfile {
        self.style.unwrap_or_default()
    }

    pub fn screen_reader(&self) -> bool {
        self.screen_reader.unwrap_or(false)
    }

    pub fn response_conventions(&self) -> ResponseConventions {
        ResponseConventions {
            thought_marker: self
                .thought_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_THOUGHT_MARKER.to_string()),
            default_confidence: self
                .default_confidence
                .filter(|value| (0.0..=1.0).contains(value))
                .unwrap_or(DEFAULT_CONFIDENCE),
        }
    }

    /// Gateway settings, with `model_override` taking precedence over the stored model.
    pub fn gateway_settings(&self, model_override: Option<&str>) -> GatewaySettings {
        GatewaySettings {
            base_url: self.base_url().to_string(),
            model: model_override.unwrap_or(self.model()).to_string(),
            vision_model: self.vision_model().to_string(),
            probe_model: DEFAULT_MODEL.to_string(),
            conventions: self.response_conventions(),
        }
    }
}
