//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    base_url_handler, font_size_handler, model_handler, screen_reader_handler, style_handler,
    theme_handler, thought_marker_handler, vision_model_handler, DefaultConfidenceHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `causerie set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(base_url_handler()));
        registry.register(Box::new(model_handler()));
        registry.register(Box::new(vision_model_handler()));
        registry.register(Box::new(style_handler()));
        registry.register(Box::new(theme_handler()));
        registry.register(Box::new(font_size_handler()));
        registry.register(Box::new(screen_reader_handler()));
        registry.register(Box::new(thought_marker_handler()));
        registry.register(Box::new(DefaultConfidenceHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
