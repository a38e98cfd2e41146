// ABOUTME: Engine connection settings.
// ABOUTME: File values overridden by DOCKER_HOST, DOCKER_TLS_VERIFY, DOCKER_CERT_PATH.

use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_HOST: &str = "DOCKER_HOST";
pub const ENV_TLS_VERIFY: &str = "DOCKER_TLS_VERIFY";
pub const ENV_CERT_PATH: &str = "DOCKER_CERT_PATH";

/// Where and how to reach the container engine.
///
/// No host means the local socket is auto-detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub tls_verify: bool,

    #[serde(default)]
    pub cert_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply the standard Docker client environment variables on top.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var(ENV_HOST)
            && !host.is_empty()
        {
            self.host = Some(host);
        }
        if let Ok(verify) = std::env::var(ENV_TLS_VERIFY) {
            self.tls_verify = matches!(verify.as_str(), "1" | "yes");
        }
        if let Ok(path) = std::env::var(ENV_CERT_PATH)
            && !path.is_empty()
        {
            self.cert_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Certificate directory, `~/.docker` unless configured.
    pub fn cert_dir(&self) -> PathBuf {
        match self.cert_path {
            Some(ref path) => path.clone(),
            None => std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_default()
                .join(".docker"),
        }
    }

    pub fn ca_cert(&self) -> PathBuf {
        self.cert_dir().join("ca.pem")
    }

    pub fn client_cert(&self) -> PathBuf {
        self.cert_dir().join("cert.pem")
    }

    pub fn client_key(&self) -> PathBuf {
        self.cert_dir().join("key.pem")
    }
}
