// ABOUTME: Configuration types and parsing for tagpull.yml.
// ABOUTME: Engine, registry, and bridge probe settings, all optional.

mod deserialize;
mod engine;
mod init;
mod registry;

pub use engine::{ENV_CERT_PATH, ENV_HOST, ENV_TLS_VERIFY, EngineConfig};
pub use init::init_config;
pub use registry::{AuthConfig, EnvValue, RegistryConfig};

use crate::error::{Error, Result};
use crate::pull::DEFAULT_PIPE_CAPACITY;
use crate::types::ImageName;
use deserialize::deserialize_image_name_option;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "tagpull.yml";
pub const CONFIG_FILENAME_ALT: &str = "tagpull.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".tagpull/config.yml";

/// Small image whose container reports the bridge gateway.
pub const DEFAULT_PROBE_IMAGE: &str = "gliderlabs/alpine:3.2";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default = "default_pipe_capacity")]
    pub pipe_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            registry: RegistryConfig::default(),
            bridge: BridgeConfig::default(),
            pipe_capacity: default_pipe_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default, deserialize_with = "deserialize_image_name_option")]
    pub probe_image: Option<ImageName>,
}

impl BridgeConfig {
    /// The configured probe image, or the default one.
    pub fn probe_image(&self) -> Result<ImageName> {
        match self.probe_image {
            Some(ref image) => Ok(image.clone()),
            None => ImageName::parse(DEFAULT_PROBE_IMAGE).map_err(Error::from),
        }
    }
}

fn default_pipe_capacity() -> usize {
    DEFAULT_PIPE_CAPACITY
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a map of defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        if config.pipe_capacity == 0 {
            return Err(Error::InvalidConfig(
                "pipe_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but a missing file means all defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Engine settings with the Docker client environment applied.
    pub fn engine_settings(&self) -> EngineConfig {
        self.engine.clone().with_env_overrides()
    }
}
