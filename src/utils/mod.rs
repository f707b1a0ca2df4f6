/// Court configuration (TOML file, environment, defaults).
pub mod config;

pub use config::{ConfigError, CourtConfig, ProviderKind};
