//! Shared data model, prompt catalog, and environment configuration for the
//! AI visibility tracker.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use app_config::{AppConfig, FailurePolicy};
pub use catalog::{load_catalog, parse_catalog, CatalogFile, CategoryConfig, PromptCatalog};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use types::{ErrorKind, Prompt, Provider, QueryOutcome, QueryStatus};
