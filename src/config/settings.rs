//! Configuration structs, defaults, TOML persistence and startup validation.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files. Unlike a desktop app,
//! a missing config file is an error: the file carries the ingestion
//! credentials and there is no useful run without them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating the configuration.
///
/// Every variant is fatal: the program aborts before the catalog scan.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist at the given path.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required secret or identity field is empty.
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// A fraction tunable is outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidFraction { field: &'static str, value: f64 },

    /// A duration tunable is negative or not finite.
    #[error("selection.target_duration_secs must be finite and >= 0, got {0}")]
    InvalidDuration(f64),
}

// ---------------------------------------------------------------------------
// IngestionConfig
// ---------------------------------------------------------------------------

/// Connection details for the remote ingestion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Base URL of the ingestion API, without a trailing slash.
    pub base_url: String,
    /// API key sent in the `x-api-key` header — secret.
    pub api_key: String,
    /// Pre-shared symmetric key used to sign envelopes — secret.
    pub hmac_key: String,
    /// Maximum seconds to wait for a single upload request.
    pub timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ingestion.edgeimpulse.com/api".into(),
            api_key: String::new(),
            hmac_key: String::new(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceConfig
// ---------------------------------------------------------------------------

/// Identity of the (virtual) device the envelopes claim to originate from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name embedded in every envelope payload.
    pub name: String,
    /// Device type embedded in every envelope payload.
    #[serde(rename = "type")]
    pub device_type: String,
}

// ---------------------------------------------------------------------------
// SelectionConfig
// ---------------------------------------------------------------------------

/// Tunables for the catalog selection pass and the partition split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Class label to curate from the catalog.
    pub label: String,
    /// Target total duration of the selection in seconds (soft cap — the
    /// scan may overshoot by the duration of the last accepted clip).
    pub target_duration_secs: f64,
    /// Fraction of the target duration that foreground-salience clips may
    /// occupy, in `[0, 1]`. Hard cap, checked before accepting each clip.
    pub foreground_fraction: f64,
    /// Fraction of the selection assigned to the testing partition, in
    /// `[0, 1]`. The split is by scan position, not random.
    pub testing_fraction: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            label: "engine_idling".into(),
            target_duration_secs: 600.0,
            foreground_fraction: 0.5,
            testing_fraction: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// Locations of the corpus on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// CSV metadata file describing every clip in the corpus.
    pub metadata_file: PathBuf,
    /// Directory containing the `fold{N}` audio subdirectories.
    pub audio_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            metadata_file: PathBuf::from("UrbanSound8K/metadata/UrbanSound8K.csv"),
            audio_dir: PathBuf::from("UrbanSound8K/audio"),
        }
    }
}

// ---------------------------------------------------------------------------
// CuratorConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as a TOML file.
///
/// Loaded once at startup and passed explicitly into the scanner, builder
/// and dispatcher constructors — nothing reads it from ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Ingestion service connection and credentials.
    pub ingestion: IngestionConfig,
    /// Device identity embedded in envelopes.
    pub device: DeviceConfig,
    /// Selection and split tunables.
    pub selection: SelectionConfig,
    /// Corpus locations.
    pub catalog: CatalogConfig,
}

impl CuratorConfig {
    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the file does not exist, and
    /// I/O or parse variants when it cannot be read or decoded.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories as needed.
    /// Mainly useful for writing a starter file and for tests.
    pub fn save_to(&self, path: &Path) -> Result<(), anyhow::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that secrets are present and tunables are in range.
    ///
    /// # Errors
    ///
    /// Returns the first violation found; all variants are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingestion.api_key.is_empty() {
            return Err(ConfigError::MissingField("ingestion.api_key"));
        }
        if self.ingestion.hmac_key.is_empty() {
            return Err(ConfigError::MissingField("ingestion.hmac_key"));
        }
        if self.ingestion.base_url.is_empty() {
            return Err(ConfigError::MissingField("ingestion.base_url"));
        }
        if self.device.name.is_empty() {
            return Err(ConfigError::MissingField("device.name"));
        }
        if self.device.device_type.is_empty() {
            return Err(ConfigError::MissingField("device.type"));
        }
        if self.selection.label.is_empty() {
            return Err(ConfigError::MissingField("selection.label"));
        }

        let d = self.selection.target_duration_secs;
        if !d.is_finite() || d < 0.0 {
            return Err(ConfigError::InvalidDuration(d));
        }
        for (field, value) in [
            ("selection.foreground_fraction", self.selection.foreground_fraction),
            ("selection.testing_fraction", self.selection.testing_fraction),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidFraction { field, value });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
