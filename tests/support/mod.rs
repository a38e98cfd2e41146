// ABOUTME: Test support utilities.
// ABOUTME: In-memory engine, candidate source, and registry fakes.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use tagpull::registry::{RegistryError, TagRegistry};
use tagpull::resolve::{CandidateSource, ListingError};
use tagpull::runtime::{
    ContainerConfig, ContainerError, ContainerInfo, ContainerOps, ImageError, ImageOps,
    ImageSummary, NetworkInfo, NetworkSettings, PullImageRequest, RegistryAuth, RemoveOptions,
};
use tagpull::types::{ContainerId, ImageId, ImageName};
use tokio::io::{AsyncWrite, AsyncWriteExt};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("tagpull=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const PROBE_CONTAINER_ID: &str = "0123456789abcdef0123456789abcdef";

/// Scripted engine that records every call it receives.
#[derive(Default)]
pub struct FakeEngine {
    pub images: Vec<ImageSummary>,
    pub fail_list: bool,
    pub image_present: bool,
    pub fail_exists: bool,
    /// JSON lines written to the sink by `pull_image`, newline added.
    pub progress: Vec<String>,
    /// Makes `pull_image` fail after writing `progress`.
    pub pull_failure: Option<String>,
    pub gateway: Option<String>,
    pub fail_start: bool,
    pub fail_inspect: bool,
    pub fail_remove: bool,
    /// Every call received, in order.
    pub log: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

pub fn summary(id: &str, repo_tags: &[&str]) -> ImageSummary {
    ImageSummary {
        id: ImageId::new(id),
        repo_tags: repo_tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn progress_line(id: &str, status: &str) -> String {
    format!(r#"{{"id":"{}","status":"{}"}}"#, id, status)
}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError> {
        self.record("list");
        if self.fail_list {
            return Err(ImageError::Runtime("engine unavailable".to_string()));
        }
        Ok(self.images.clone())
    }

    async fn image_exists(&self, image: &ImageName) -> Result<bool, ImageError> {
        self.record(format!("exists {}", image));
        if self.fail_exists {
            return Err(ImageError::Runtime("inspect refused".to_string()));
        }
        Ok(self.image_present)
    }

    async fn pull_image(
        &self,
        request: &PullImageRequest,
        _auth: Option<&RegistryAuth>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), ImageError> {
        self.record(format!("pull {}:{}", request.repository, request.tag));
        for line in &self.progress {
            output
                .write_all(format!("{}\n", line).as_bytes())
                .await
                .map_err(|e| ImageError::Runtime(e.to_string()))?;
        }
        match self.pull_failure {
            Some(ref reason) => Err(ImageError::PullFailed(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        self.record(format!("create {}", config.image));
        Ok(ContainerId::new(PROBE_CONTAINER_ID))
    }

    async fn start_container(&self, _id: &ContainerId) -> Result<(), ContainerError> {
        self.record("start");
        if self.fail_start {
            return Err(ContainerError::Runtime("start refused".to_string()));
        }
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        self.record("inspect");
        if self.fail_inspect {
            return Err(ContainerError::Runtime("inspect refused".to_string()));
        }

        let mut network_settings = NetworkSettings::default();
        if let Some(ref gateway) = self.gateway {
            network_settings.networks.insert(
                "bridge".to_string(),
                NetworkInfo {
                    gateway: gateway.clone(),
                    ..Default::default()
                },
            );
        }
        Ok(ContainerInfo {
            id: id.clone(),
            image: "gliderlabs/alpine:3.2".to_string(),
            network_settings,
        })
    }

    async fn remove_container(
        &self,
        _id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), ContainerError> {
        self.record(format!(
            "remove force={} volumes={}",
            options.force, options.remove_volumes
        ));
        if self.fail_remove {
            return Err(ContainerError::Runtime("remove refused".to_string()));
        }
        Ok(())
    }
}

/// Candidate source returning fixed tags of the requested repository.
pub struct FakeSource {
    tags: Option<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn tags(tags: &[&str]) -> Self {
        Self {
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::tags(&[])
    }

    pub fn failing() -> Self {
        Self {
            tags: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateSource for FakeSource {
    async fn list_candidates(&self, image: &ImageName) -> Result<Vec<ImageName>, ListingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.tags {
            Some(ref tags) => Ok(tags.iter().map(|t| image.with_tag(t.as_str())).collect()),
            None => Err(ImageError::Runtime("listing refused".to_string()).into()),
        }
    }
}

/// Registry that answers every repository with the same tags.
pub struct FakeRegistry {
    pub tags: Vec<String>,
}

#[async_trait]
impl TagRegistry for FakeRegistry {
    async fn list_tags(&self, _image: &ImageName) -> Result<Vec<String>, RegistryError> {
        Ok(self.tags.clone())
    }
}
