// ABOUTME: Candidate sources for tag resolution.
// ABOUTME: Local engine images and remote registry tags, both as ImageNames.

use super::error::ListingError;
use crate::registry::TagRegistry;
use crate::runtime::ImageOps;
use crate::types::ImageName;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

/// Produces candidate references for one reference from one place.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn list_candidates(&self, image: &ImageName) -> Result<Vec<ImageName>, ListingError>;
}

#[async_trait]
impl<T: CandidateSource + ?Sized> CandidateSource for Arc<T> {
    async fn list_candidates(&self, image: &ImageName) -> Result<Vec<ImageName>, ListingError> {
        (**self).list_candidates(image).await
    }
}

/// Images already present in the local engine.
pub struct LocalCandidates<E> {
    engine: Arc<E>,
}

impl<E: ImageOps> LocalCandidates<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: ImageOps> CandidateSource for LocalCandidates<E> {
    /// Keeps at most one tag per local image: the first one `image` contains.
    async fn list_candidates(&self, image: &ImageName) -> Result<Vec<ImageName>, ListingError> {
        let summaries = self.engine.list_images().await?;

        let mut candidates = Vec::new();
        for summary in &summaries {
            let contained = summary.repo_tags.iter().find_map(|repo_tag| {
                match ImageName::parse_concrete(repo_tag) {
                    Ok(candidate) if image.contains(&candidate) => Some(candidate),
                    Ok(_) => None,
                    Err(e) => {
                        trace!(repo_tag = %repo_tag, error = %e, "skipping unparsable local tag");
                        None
                    }
                }
            });
            candidates.extend(contained);
        }

        debug!(
            image = %image,
            images = summaries.len(),
            candidates = candidates.len(),
            "listed local candidates"
        );
        Ok(candidates)
    }
}

/// Tags published by the image's registry.
pub struct RegistryCandidates<R> {
    registry: Arc<R>,
}

impl<R: TagRegistry> RegistryCandidates<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl<R: TagRegistry> CandidateSource for RegistryCandidates<R> {
    /// Every published tag, unfiltered.
    async fn list_candidates(&self, image: &ImageName) -> Result<Vec<ImageName>, ListingError> {
        let tags = self.registry.list_tags(image).await?;
        debug!(image = %image, candidates = tags.len(), "listed registry candidates");
        Ok(tags.into_iter().map(|tag| image.with_tag(tag)).collect())
    }
}
