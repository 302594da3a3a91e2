//! Configuration module.
//!
//! Provides [`CuratorConfig`] (top-level settings), sub-configs for each
//! subsystem, TOML persistence via `CuratorConfig::load_from` /
//! `CuratorConfig::save_to`, and startup validation.

pub mod settings;

pub use settings::{
    CatalogConfig, ConfigError, CuratorConfig, DeviceConfig, IngestionConfig, SelectionConfig,
};
