// ABOUTME: Bollard-based container engine implementation.
// ABOUTME: Supports both Docker and Podman via Docker-compatible API.

use crate::config::EngineConfig;
use crate::progress::{ErrorDetail, ProgressDetail, ProgressMessage};
use crate::runtime::detection::{RuntimeInfo, RuntimeType, detect_local, runtime_for_socket};
use crate::runtime::error::{ConnectError, ConnectionSnafu};
use crate::runtime::traits::{
    ContainerConfig, ContainerError, ContainerInfo, ContainerOps, ImageError, ImageOps,
    ImageSummary, NetworkInfo, NetworkSettings, PullImageRequest, RegistryAuth, RemoveOptions,
};
use crate::types::{ContainerId, ImageId, ImageName};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, CreateImageInfo, HostConfig};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListImagesOptionsBuilder,
    RemoveContainerOptions, StartContainerOptions,
};
use futures::StreamExt;
use snafu::ResultExt;
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Seconds before an engine request times out.
const ENGINE_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 401 || *status_code == 403 =>
        {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, e))
        }
        _ => ImageError::PullFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

impl From<&CreateImageInfo> for ProgressMessage {
    fn from(info: &CreateImageInfo) -> Self {
        ProgressMessage {
            id: info.id.clone(),
            status: info.status.clone(),
            progress_detail: info.progress_detail.as_ref().map(|d| ProgressDetail {
                current: d.current,
                total: d.total,
            }),
            error_detail: info.error_detail.as_ref().map(|d| ErrorDetail {
                code: d.code,
                message: d.message.clone(),
            }),
            error: None,
        }
    }
}

// =============================================================================
// BollardEngine
// =============================================================================

/// Container engine implementation using bollard.
///
/// Supports both Docker and Podman via Docker-compatible API.
pub struct BollardEngine {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardEngine {
    /// Create a new BollardEngine from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect according to the engine configuration.
    ///
    /// An explicit host picks unix socket, TLS, or plain HTTP transport;
    /// without one the local socket is auto-detected.
    pub fn connect(config: &EngineConfig) -> Result<Self, ConnectError> {
        let Some(host) = config.host.as_deref().filter(|h| !h.is_empty()) else {
            return Self::connect_local(&detect_local()?);
        };

        if let Some(socket_path) = host.strip_prefix("unix://") {
            let info = RuntimeInfo {
                runtime_type: runtime_for_socket(socket_path),
                socket_path: socket_path.to_string(),
            };
            return Self::connect_local(&info);
        }

        let connected = if config.tls_verify {
            Docker::connect_with_ssl(
                host,
                &config.client_key(),
                &config.client_cert(),
                &config.ca_cert(),
                ENGINE_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            )
        } else {
            Docker::connect_with_http(host, ENGINE_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        };
        let client = connected.context(ConnectionSnafu { address: host })?;

        tracing::debug!(host, tls = config.tls_verify, "connected to remote engine");
        Ok(Self::new(client, RuntimeType::Docker))
    }

    /// Connect to a container runtime using detected runtime info.
    pub fn connect_local(info: &RuntimeInfo) -> Result<Self, ConnectError> {
        let client = Docker::connect_with_unix(
            &info.socket_path,
            ENGINE_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .context(ConnectionSnafu {
            address: info.socket_path.as_str(),
        })?;

        tracing::debug!(
            runtime = %info.runtime_type,
            socket = %info.socket_path,
            "connected to local engine"
        );
        Ok(Self::new(client, info.runtime_type))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }
}

#[async_trait]
impl ImageOps for BollardEngine {
    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError> {
        let opts = ListImagesOptionsBuilder::new().build();
        let images = self
            .client
            .list_images(Some(opts))
            .await
            .map_err(|e| ImageError::Runtime(format!("failed to list images: {}", e)))?;

        Ok(images
            .into_iter()
            .map(|image| ImageSummary {
                id: ImageId::new(image.id),
                repo_tags: image.repo_tags,
            })
            .collect())
    }

    async fn image_exists(&self, image: &ImageName) -> Result<bool, ImageError> {
        let image_name = image.to_string();

        match self.client.inspect_image(&image_name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                image_name, e
            ))),
        }
    }

    async fn pull_image(
        &self,
        request: &PullImageRequest,
        auth: Option<&RegistryAuth>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), ImageError> {
        let image_name = format!("{}:{}", request.repository, request.tag);

        let opts = CreateImageOptions {
            from_image: Some(request.repository.clone()),
            tag: Some(request.tag.clone()),
            ..Default::default()
        };

        let credentials = auth.map(|a| bollard::auth::DockerCredentials {
            username: Some(a.username.clone()),
            password: Some(a.password.clone()),
            serveraddress: a.server.clone().or_else(|| request.registry.clone()),
            ..Default::default()
        });

        // Each progress update is re-encoded as one JSON line for the sink
        let mut stream = self.client.create_image(Some(opts), None, credentials);
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| map_image_pull_error(e, &image_name))?;
            let message = ProgressMessage::from(&info);

            if let Some(reason) = message.error_message() {
                return Err(ImageError::PullFailed(format!("{}: {}", image_name, reason)));
            }

            let line = message
                .to_json_line()
                .map_err(|e| ImageError::Runtime(format!("failed to encode progress: {}", e)))?;
            output
                .write_all(&line)
                .await
                .map_err(|e| ImageError::Runtime(format!("failed to write progress: {}", e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardEngine {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let container_config = ContainerCreateBody {
            image: Some(config.image.to_string()),
            cmd: if config.command.is_empty() {
                None
            } else {
                Some(config.command.clone())
            },
            host_config: Some(HostConfig::default()),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: config.name.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), container_config)
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let mut networks = HashMap::new();
        if let Some(ref network_settings) = details.network_settings
            && let Some(ref nets) = network_settings.networks
        {
            for (name, endpoint) in nets {
                networks.insert(
                    name.clone(),
                    NetworkInfo {
                        network_id: endpoint.network_id.clone().unwrap_or_default(),
                        ip_address: endpoint.ip_address.clone().unwrap_or_default(),
                        gateway: endpoint.gateway.clone().unwrap_or_default(),
                    },
                );
            }
        }

        Ok(ContainerInfo {
            id: id.clone(),
            image: details
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            network_settings: NetworkSettings { networks },
        })
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force: options.force,
            v: options.remove_volumes,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }
}
