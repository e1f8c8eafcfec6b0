#[cfg(feature = "cli")]
pub mod cli;
pub mod service;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliArgs, Command};
pub use service::ServiceProfile;
pub use toml_config::BotConfig;
