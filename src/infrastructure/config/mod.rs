//! Application configuration.

mod logging;
mod settings;

pub use logging::LoggingConfig;
pub use settings::{Config, DatabaseConfig};
