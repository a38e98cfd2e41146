// ABOUTME: Registry access settings.
// ABOUTME: Request timeout and optional credentials for tag listing and pulls.

use crate::error::{Error, Result};
use crate::runtime::RegistryAuth;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            auth: None,
        }
    }
}

impl RegistryConfig {
    /// Credentials with environment references filled in.
    pub fn credentials(&self) -> Result<Option<RegistryAuth>> {
        self.auth.as_ref().map(AuthConfig::resolve).transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub username: EnvValue,
    pub password: EnvValue,
    #[serde(default)]
    pub server: Option<String>,
}

impl AuthConfig {
    pub fn resolve(&self) -> Result<RegistryAuth> {
        Ok(RegistryAuth {
            username: self.username.resolve()?,
            password: self.password.resolve()?,
            server: self.server.clone(),
        })
    }
}

/// A credential given inline or as `{env: VAR, default: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    /// An empty variable counts as unset.
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => std::env::var(var)
                .ok()
                .filter(|val| !val.is_empty())
                .or_else(|| default.clone())
                .ok_or_else(|| Error::MissingEnvVar(var.clone())),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}
