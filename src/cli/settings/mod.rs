//! Settings management for CLI set/unset commands.
//!
//! Each stored preference has a handler that knows how to parse, store,
//! clear and display it:
//!
//! - Choice settings (e.g., `theme`, `style`)
//! - Boolean settings (e.g., `screen-reader`)
//! - String settings (e.g., `model`, `base-url`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::{Config, ConfigOrchestrator};

/// Context provided to setting handlers during set/unset operations.
pub struct SetContext<'a> {
    pub config: &'a ConfigOrchestrator,
}

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the words following the key.
    ///
    /// Returns a success message to display.
    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError>;

    /// Clear the configuration value so the default applies again.
    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError>;

    /// Format the current value for display in `causerie set` output.
    fn format(&self, config: &Config) -> String;
}
