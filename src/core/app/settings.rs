use tracing::debug;

use super::{App, AppError, NoticeLevel};
use crate::core::config::{Config, ConfigError, FontSize, Theme};
use crate::core::style::StyleProfile;

/// Current user-adjustable settings, as the UI should render them.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub theme: Theme,
    pub font_size: FontSize,
    pub style: StyleProfile,
    pub screen_reader: bool,
    pub model: String,
    pub voice_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceToggle {
    Started,
    /// Capture ended; carries the recognized text, if any.
    Stopped(Option<String>),
}

impl App {
    pub fn preferences(&self) -> Preferences {
        Preferences {
            theme: self.preferences.theme(),
            font_size: self.preferences.font_size(),
            style: self.style,
            screen_reader: self.preferences.screen_reader(),
            model: self.gateway.model(),
            voice_active: self.voice_active,
        }
    }

    pub fn style(&self) -> StyleProfile {
        self.style
    }

    /// Applies to every later request. Stored as the default for future runs.
    pub fn set_style(&mut self, style: StyleProfile) -> Result<(), AppError> {
        self.style = style;
        self.update_preferences(|config| config.style = Some(style))
    }

    pub fn set_model(&mut self, model: &str) -> Result<(), AppError> {
        let model = model.trim().to_string();
        if model.is_empty() {
            return Ok(());
        }
        self.gateway.set_model(model.clone());
        self.status.set_model(&model);
        self.update_preferences(|config| config.model = Some(model))
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), AppError> {
        self.update_preferences(|config| config.theme = Some(theme))
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, AppError> {
        let theme = self.preferences.theme().toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    pub fn set_font_size(&mut self, size: FontSize) -> Result<(), AppError> {
        self.update_preferences(|config| config.font_size = Some(size))
    }

    pub fn toggle_screen_reader(&mut self) -> Result<bool, AppError> {
        let enabled = !self.preferences.screen_reader();
        self.update_preferences(|config| config.screen_reader = Some(enabled))?;
        Ok(enabled)
    }

    /// Start voice capture, or stop it and hand back the recognized text.
    pub fn toggle_voice(&mut self) -> Result<VoiceToggle, AppError> {
        if self.voice_active {
            self.voice_active = false;
            return Ok(VoiceToggle::Stopped(self.voice.stop()));
        }
        self.voice.start()?;
        self.voice_active = true;
        Ok(VoiceToggle::Started)
    }

    /// Check `candidate` against the API and, when accepted, store and use it.
    pub async fn set_credential(&mut self, candidate: &str) -> Result<(), AppError> {
        let candidate = candidate.trim();
        if !self.gateway.validate_credential(candidate).await? {
            self.notify(NoticeLevel::Error, AppError::CredentialRejected.to_string());
            return Err(AppError::CredentialRejected);
        }

        self.credentials.store(candidate)?;
        self.gateway.set_credential(Some(candidate.to_string()));
        self.store.set_credential_configured(true);
        self.notify(NoticeLevel::Info, "API key saved");
        Ok(())
    }

    /// Forget the stored key. A key from the environment is picked up again.
    pub fn clear_credential(&mut self) -> Result<bool, AppError> {
        let removed = self.credentials.remove()?;
        let fallback = self.credentials.resolve()?.map(|resolved| resolved.secret);
        let configured = fallback.is_some();
        self.gateway.set_credential(fallback);
        self.store.set_credential_configured(configured);
        Ok(removed)
    }

    pub fn has_credential(&self) -> bool {
        self.gateway.has_credential()
    }

    fn update_preferences(&mut self, apply: impl FnOnce(&mut Config)) -> Result<(), AppError> {
        let updated = self.config.mutate(|config| {
            apply(config);
            Ok::<_, ConfigError>(config.clone())
        })?;
        debug!(path = %self.config.path().display(), "Preferences saved");
        self.preferences = updated;
        Ok(())
    }
}
