// ABOUTME: Shared types used across engine trait definitions.
// ABOUTME: Pull requests, image summaries, container config/info, RegistryAuth.

use crate::types::{ContainerId, ImageId, ImageName};
use std::collections::HashMap;

/// A pull of one concrete tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullImageRequest {
    /// Repository, qualified with the registry host when there is one.
    pub repository: String,
    /// Registry host, if the image is not on Docker Hub.
    pub registry: Option<String>,
    /// Tag to pull. Never a range.
    pub tag: String,
}

impl PullImageRequest {
    pub fn for_image(image: &ImageName) -> Self {
        Self {
            repository: image.name_with_registry(),
            registry: image.registry().map(str::to_string),
            tag: image.tag().to_string(),
        }
    }
}

/// A locally present image and the `repo:tag` labels pointing at it.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    pub id: ImageId,
    pub repo_tags: Vec<String>,
}

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Optional container name. The engine picks one when absent.
    pub name: Option<String>,
    /// Image to run.
    pub image: ImageName,
    /// Command to run (overrides image CMD).
    pub command: Vec<String>,
}

/// Options for removing a container.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Kill the container first if it is running.
    pub force: bool,
    /// Remove anonymous volumes along with it.
    pub remove_volumes: bool,
}

/// Information about a container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Container ID.
    pub id: ContainerId,
    /// Image used.
    pub image: String,
    /// Network settings.
    pub network_settings: NetworkSettings,
}

/// Network settings for a container.
#[derive(Debug, Clone, Default)]
pub struct NetworkSettings {
    /// Endpoints by network name.
    pub networks: HashMap<String, NetworkInfo>,
}

impl NetworkSettings {
    /// Gateway of the default `bridge` network, falling back to any
    /// attached network that reports one.
    pub fn gateway(&self) -> Option<&str> {
        self.networks
            .get("bridge")
            .and_then(NetworkInfo::non_empty_gateway)
            .or_else(|| {
                let mut names: Vec<&String> = self.networks.keys().collect();
                names.sort();
                names.into_iter().find_map(|name| {
                    self.networks
                        .get(name)
                        .and_then(NetworkInfo::non_empty_gateway)
                })
            })
    }
}

/// Network information for a container.
#[derive(Debug, Clone, Default)]
pub struct NetworkInfo {
    /// Network ID.
    pub network_id: String,
    /// IP address in this network.
    pub ip_address: String,
    /// Gateway.
    pub gateway: String,
}

impl NetworkInfo {
    fn non_empty_gateway(&self) -> Option<&str> {
        Some(self.gateway.as_str()).filter(|g| !g.is_empty())
    }
}

/// Registry authentication credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    /// Username.
    pub username: String,
    /// Password or token.
    pub password: String,
    /// Registry server (e.g., "ghcr.io").
    pub server: Option<String>,
}
