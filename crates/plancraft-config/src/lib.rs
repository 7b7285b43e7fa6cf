//! # plancraft-config
//!
//! Configuration system for the Plancraft backend. Reads from `plancraft.toml`
//! and environment variables, in that precedence order for most keys. The model
//! credential is the exception: the file wins, then `API_KEY`, then `GOOGLE_API_KEY`.

pub mod loader;
pub mod schema;

pub use loader::{ConfigLoader, init_settings, settings};
pub use schema::PlanConfig;
pub use schema::{
    ConfigWarning, DatabaseConfig, LoggingConfig, ModelConfig, ServerConfig, ServicesConfig,
    WarningSeverity, MISSING_API_KEY_MESSAGE,
};
