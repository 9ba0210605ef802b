pub mod data;
pub mod defaults;
pub mod io;
pub mod orchestrator;

pub use data::{Config, FontSize, Theme};
pub use io::ConfigError;
pub use orchestrator::ConfigOrchestrator;
