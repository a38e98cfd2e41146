// ABOUTME: Image operations trait for container engines.
// ABOUTME: List local images, check existence, and pull with a progress sink.

use super::shared_types::{ImageSummary, PullImageRequest, RegistryAuth};
use crate::types::ImageName;
use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// Image operations: list, check existence, pull.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// List every image the engine has locally, with its repository tags.
    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError>;

    /// Check if an image exists locally. A missing image is `Ok(false)`.
    async fn image_exists(&self, image: &ImageName) -> Result<bool, ImageError>;

    /// Pull an image from a registry.
    ///
    /// Progress is written to `output` as newline-delimited JSON records
    /// (see [`crate::progress::ProgressMessage`]). The caller owns closing
    /// the sink once this returns.
    async fn pull_image(
        &self,
        request: &PullImageRequest,
        auth: Option<&RegistryAuth>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
