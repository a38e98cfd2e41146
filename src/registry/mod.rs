// ABOUTME: Remote registry tag listing.
// ABOUTME: TagRegistry trait plus the Registry v2 HTTP client.

mod client;
mod error;

pub use client::RegistryClient;
pub use error::RegistryError;

use crate::types::ImageName;
use async_trait::async_trait;

/// Lists the tags a registry holds for a repository.
#[async_trait]
pub trait TagRegistry: Send + Sync {
    /// All tags of `image`'s repository, in the order the registry reports them.
    async fn list_tags(&self, image: &ImageName) -> Result<Vec<String>, RegistryError>;
}
