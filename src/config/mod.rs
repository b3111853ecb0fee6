pub mod settings;

pub use settings::{Config, ConfigError, GerritConfig, GitConfig, LoggingConfig};
