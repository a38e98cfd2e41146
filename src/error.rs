// ABOUTME: Application-wide error types for tagpull.
// ABOUTME: Wraps config, engine, registry, resolution, pull, and bridge failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::pull::PullError;
use crate::registry::RegistryError;
use crate::resolve::ResolveError;
use crate::runtime::ConnectError;
use crate::types::ParseImageNameError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid image name: {0}")]
    InvalidImage(#[from] ParseImageNameError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Pull(#[from] PullError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, Error>;
